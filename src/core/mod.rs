//! Core types: entities, the world store, RNG, configuration.
//!
//! Everything above this module (interpreter, vetting pipeline) is written
//! against these types and nothing else from the host simulation.

pub mod entity;
pub mod world;
pub mod rng;
pub mod config;

pub use entity::EntityId;
pub use world::{Entity, Position, StatusEffect, World, HEALTH_SCALE, WORLD_BOUND};
pub use rng::FlavorRng;
pub use config::{DiscoveryConfig, EvaluatorLimits, ForgeConfig, InterpreterLimits};
