//! Phrase selection.
//!
//! Flavor text is picked through [`PhrasePicker`] so tests (and hosts
//! that want stable output) can swap in [`FirstPhrase`].

use std::sync::Mutex;

use crate::core::FlavorRng;

/// Chooses one phrasing among equivalents.
pub trait PhrasePicker: Send + Sync {
    /// Pick one phrase. Returns `""` for an empty list.
    fn pick(&self, phrases: &[&'static str]) -> &'static str;
}

/// Seeded pseudo-random choice. The same seed yields the same sequence.
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<FlavorRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(FlavorRng::new(seed)),
        }
    }
}

impl PhrasePicker for SeededPicker {
    fn pick(&self, phrases: &[&'static str]) -> &'static str {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.choose(phrases).copied().unwrap_or("")
    }
}

/// Always the first phrasing.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstPhrase;

impl PhrasePicker for FirstPhrase {
    fn pick(&self, phrases: &[&'static str]) -> &'static str {
        phrases.first().copied().unwrap_or("")
    }
}
