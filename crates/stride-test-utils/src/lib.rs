//! Shared test fixtures and utilities for stride crates.
//!
//! Provides small robots and environments that resolve without asset
//! files, plus deterministic RNG setup for randomization tests.

pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{minimal_env, minimal_task, two_knee_robot};
pub use rng::seeded_rng;
