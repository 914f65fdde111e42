//! Harness error types
//!
//! Every failure before the suite runs is fatal. Errors are grouped by the
//! stage that raised them so the run driver can pick the exit status.

use std::fmt;
use thiserror::Error;

/// Exit status when the suite passed but background tasks leaked
pub const EXIT_LEAK: u8 = 1;
/// Exit status for bad flags or feature directives
pub const EXIT_CONFIGURATION: u8 = 2;
/// Exit status when the environment could not be prepared
pub const EXIT_ENVIRONMENT: u8 = 3;
/// Exit status when closing the environment failed
pub const EXIT_TEARDOWN: u8 = 4;

/// Step of environment resolution that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    MockStart,
    MockControl,
    Connect,
    VersionParse,
    TaskCounter,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupStep::MockStart => write!(f, "mock start"),
            SetupStep::MockControl => write!(f, "mock control"),
            SetupStep::Connect => write!(f, "connect"),
            SetupStep::VersionParse => write!(f, "version parse"),
            SetupStep::TaskCounter => write!(f, "task counter"),
        }
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Command line error: {0}")]
    Cli(#[from] clap::Error),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Failed to parse feature directive '{token}': expected a leading '+' or '-'")]
    InvalidFeatureDirective { token: String },

    #[error("Environment setup failed during {step}: {reason}")]
    EnvironmentSetup { step: SetupStep, reason: String },

    #[error("Failed to close {resource}: {reason}")]
    Teardown { resource: String, reason: String },
}

impl HarnessError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration { reason: reason.into() }
    }

    pub fn setup(step: SetupStep, reason: impl fmt::Display) -> Self {
        Self::EnvironmentSetup {
            step,
            reason: reason.to_string(),
        }
    }

    pub fn teardown(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Teardown {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HarnessError::Cli(_) | HarnessError::Configuration { .. } | HarnessError::InvalidFeatureDirective { .. }
        )
    }

    pub fn is_environment_setup(&self) -> bool {
        matches!(self, HarnessError::EnvironmentSetup { .. })
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            HarnessError::Cli(_) | HarnessError::Configuration { .. } | HarnessError::InvalidFeatureDirective { .. } => {
                EXIT_CONFIGURATION
            }
            HarnessError::EnvironmentSetup { .. } => EXIT_ENVIRONMENT,
            HarnessError::Teardown { .. } => EXIT_TEARDOWN,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let config = HarnessError::configuration("version cannot be specified with mock");
        assert!(config.is_configuration());
        assert_eq!(config.exit_code(), EXIT_CONFIGURATION);

        let directive = HarnessError::InvalidFeatureDirective {
            token: "query".to_string(),
        };
        assert!(directive.is_configuration());

        let setup = HarnessError::setup(SetupStep::Connect, "connection refused");
        assert!(setup.is_environment_setup());
        assert_eq!(setup.exit_code(), EXIT_ENVIRONMENT);
        assert_eq!(
            setup.to_string(),
            "Environment setup failed during connect: connection refused"
        );

        assert_eq!(HarnessError::teardown("cluster", "timeout").exit_code(), EXIT_TEARDOWN);
    }
}
