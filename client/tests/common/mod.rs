//! Common test utilities and infrastructure
//!
//! Provides an in-memory fake of the generation backend and shared test
//! data for the session client integration suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{FakeBackend, SessionBuilder};
