//! # Arena Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Seeded scene and agent fixtures
//! - Per-tick invariant harness
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod invariants;

/// Re-export proptest for convenience.
pub use proptest;
