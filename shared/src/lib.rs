//! Shared types for the integration-test harness
//!
//! Holds the vocabulary used by both the harness core and the mock adapter:
//! run stages, the server version descriptor, the shared error type and the
//! stage-aware logging setup.

pub mod errors;
pub mod logging;
pub mod types;
pub mod version;

pub use errors::*;
pub use types::*;
pub use version::{NodeEdition, NodeVersion};
