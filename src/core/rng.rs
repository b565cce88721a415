//! Deterministic random number generation for flavor text.
//!
//! Decision logic never touches randomness. The only consumer is phrase
//! selection in the blessing service, and even that is reproducible:
//! the same seed yields the same sequence of picks.
//!
//! ```
//! use effect_forge::core::FlavorRng;
//!
//! let phrases = ["radiant", "austere", "wry"];
//! let mut a = FlavorRng::new(42);
//! let mut b = FlavorRng::new(42);
//! assert_eq!(a.choose(&phrases), b.choose(&phrases));
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded ChaCha8 RNG.
#[derive(Clone, Debug)]
pub struct FlavorRng {
    inner: ChaCha8Rng,
}

impl FlavorRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }
}
