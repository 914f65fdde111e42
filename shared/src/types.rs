//! Core shared types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a harness run, attached to every log line the harness emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStage {
    /// Flag and feature-directive parsing
    Config,
    /// Mock start, connect and fixture assembly
    Resolve,
    /// The test suite itself
    Suite,
    /// Closing cluster and mock handles
    Teardown,
    /// Post-run task leak check
    LeakCheck,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::Config => write!(f, "config"),
            RunStage::Resolve => write!(f, "resolve"),
            RunStage::Suite => write!(f, "suite"),
            RunStage::Teardown => write!(f, "teardown"),
            RunStage::LeakCheck => write!(f, "leak_check"),
        }
    }
}

/// Whether the run talks to a live cluster or a locally started mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendMode {
    Real,
    Mock,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Real => write!(f, "real"),
            BackendMode::Mock => write!(f, "mock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stage_display() {
        assert_eq!(RunStage::Config.to_string(), "config");
        assert_eq!(RunStage::LeakCheck.to_string(), "leak_check");
        assert_eq!(BackendMode::Mock.to_string(), "mock");
    }
}
