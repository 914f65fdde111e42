//! Common test utilities and infrastructure
//!
//! Shared fixtures, mock builders and a recording suite used across the
//! harness integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{DriverBuilder, RecordingSuite, TestHelpers};
