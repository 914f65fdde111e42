//! Shared logging utilities for consistent tracing across the harness

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::errors::{SharedError, SharedResult};
use crate::types::RunStage;

/// Targets that always belong to the harness itself
const HARNESS_TARGETS: &[&str] = &["harness", "shared"];

/// Logging configuration for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Verbose logging for the harness, the mock adapter and the client under test
    pub verbose: bool,
}

impl LogSettings {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Build the filter directive string for these settings
    ///
    /// The leading default level covers the client under test, whatever its
    /// targets are called. The harness never drops below `info`.
    pub fn filter_directives(&self) -> String {
        let (harness_level, default_level) = if self.verbose {
            ("debug", "debug")
        } else {
            ("info", "warn")
        };

        let mut directives = vec![default_level.to_string()];
        directives.extend(HARNESS_TARGETS.iter().map(|target| format!("{target}={harness_level}")));
        directives.push(format!("cbmock={default_level}"));
        directives.join(",")
    }
}

/// Initialize the tracing subscriber for a run
///
/// `RUST_LOG` takes precedence over the computed filter. Calling this more
/// than once is harmless: later calls report an error that callers may ignore.
pub fn init_tracing(settings: &LogSettings) -> SharedResult<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.filter_directives()));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| SharedError::LoggingError { message: e.to_string() })
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for stage-aware info logging
#[macro_export]
macro_rules! stage_info {
    ($stage:expr, $($arg:tt)*) => {
        tracing::info!(
            stage = %$stage,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for stage-aware debug logging
#[macro_export]
macro_rules! stage_debug {
    ($stage:expr, $($arg:tt)*) => {
        tracing::debug!(
            stage = %$stage,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for stage-aware warning logging
#[macro_export]
macro_rules! stage_warn {
    ($stage:expr, $($arg:tt)*) => {
        tracing::warn!(
            stage = %$stage,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for stage-aware error logging
#[macro_export]
macro_rules! stage_error {
    ($stage:expr, $($arg:tt)*) => {
        tracing::error!(
            stage = %$stage,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for error conditions
pub fn log_error(stage: RunStage, context: &str, error: &dyn std::fmt::Display) {
    error!(
        stage = %stage,
        timestamp = format_timestamp(),
        error = %error,
        "{} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(stage: RunStage, message: &str) {
    info!(
        stage = %stage,
        timestamp = format_timestamp(),
        "{}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_covers_everything() {
        let settings = LogSettings::new(true);
        assert_eq!(settings.filter_directives(), "debug,harness=debug,shared=debug,cbmock=debug");
    }

    #[test]
    fn test_quiet_filter_keeps_harness_at_info() {
        let settings = LogSettings::new(false);
        assert_eq!(settings.filter_directives(), "warn,harness=info,shared=info,cbmock=warn");
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = format_timestamp();
        assert_eq!(stamp.len(), "00:00:00.000".len());
        assert_eq!(stamp.matches(':').count(), 2);
    }
}
