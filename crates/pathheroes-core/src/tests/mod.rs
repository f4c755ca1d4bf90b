//! Cross-module battle tests.
//!
//! - `scenarios.rs`: end-to-end battles with exact timings
//! - `rewards.rs`: victory rewards and reporter failure handling
//! - `determinism.rs`: seeded runs reproduce the same event stream
//! - `properties.rs`: property tests over random rosters
//! - `helpers.rs`: shared setup utilities

mod helpers;

pub use helpers::*;
