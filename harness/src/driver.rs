//! Run driver: the fixed sequence of a test run
//!
//! baseline sample → resolve environment → run suite → close environment →
//! leak check → exit status. Stages never overlap.

use std::ffi::OsString;
use std::process::ExitCode;

use clap::error::ErrorKind;
use shared::RunStage;
use shared::logging::{init_tracing, log_error, log_success};
use shared::{stage_debug, stage_info};

use crate::config::RunConfig;
use crate::core::sentinel::report_verdict;
use crate::core::{LeakPolicy, LeakReport, LeakSample, detect_leak};
use crate::error::{EXIT_LEAK, HarnessError, HarnessResult};
use crate::resolver::EnvironmentResolver;
use crate::services::{RealMockLauncher, RuntimeTaskCounter};
use crate::traits::{ClusterConnector, MockServerLauncher, TaskCounter, TestSuite};

/// Result of a run that got as far as the leak check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub suite_status: i32,
    pub leak: LeakReport,
}

impl RunOutcome {
    /// The suite's status, unless tasks leaked
    pub fn exit_code(&self) -> u8 {
        if self.leak.leaked {
            return EXIT_LEAK;
        }
        u8::try_from(self.suite_status).unwrap_or(EXIT_LEAK)
    }
}

pub struct RunDriver<C, L, T> {
    resolver: EnvironmentResolver<C, L>,
    counter: T,
    policy: LeakPolicy,
}

impl<C, L, T> RunDriver<C, L, T>
where
    C: ClusterConnector,
    L: MockServerLauncher,
    T: TaskCounter,
{
    pub fn new(connector: C, launcher: L, counter: T) -> Self {
        Self {
            resolver: EnvironmentResolver::new(connector, launcher),
            counter,
            policy: LeakPolicy::default(),
        }
    }

    /// Configure the leak check timing (fluent API)
    pub fn with_policy(mut self, policy: LeakPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Drive one run of `suite`
    ///
    /// The baseline is sampled before the environment exists: every task the
    /// environment starts is expected to be gone once it has been closed.
    pub async fn run<S>(&self, config: &RunConfig, suite: &S) -> HarnessResult<RunOutcome>
    where
        S: TestSuite + ?Sized,
    {
        let baseline = LeakSample::take(&self.counter);
        stage_debug!(RunStage::LeakCheck, "Baseline task count: {}", baseline.task_count);

        let environment = if config.offline {
            stage_info!(RunStage::Resolve, "Short mode, skipping environment resolution");
            None
        } else {
            Some(self.resolver.resolve(config).await?)
        };

        stage_info!(RunStage::Suite, "Running suite");
        let fixture = environment.as_ref().map(|env| &env.fixture);
        let suite_status = suite.run(fixture, &config.suite_args).await;
        stage_info!(RunStage::Suite, status = suite_status, "Suite finished with status {}", suite_status);

        if let Some(environment) = environment {
            environment.close().await?;
            log_success(RunStage::Teardown, "Environment closed");
        }

        let leak = detect_leak(&self.counter, baseline, &self.policy).await;
        report_verdict(&leak, &self.counter);

        Ok(RunOutcome { suite_status, leak })
    }
}

fn failed_stage(error: &HarnessError) -> RunStage {
    match error {
        HarnessError::Cli(_) | HarnessError::Configuration { .. } | HarnessError::InvalidFeatureDirective { .. } => {
            RunStage::Config
        }
        HarnessError::EnvironmentSetup { .. } => RunStage::Resolve,
        HarnessError::Teardown { .. } => RunStage::Teardown,
    }
}

/// Run `suite` with flags taken from `args`
///
/// `make_launcher` builds the mock launcher once the configuration is known.
/// Never panics; every failure becomes an exit status.
pub async fn run_with_args<I, A, C, L, F, S>(args: I, connector: C, make_launcher: F, suite: S) -> ExitCode
where
    I: IntoIterator<Item = A>,
    A: Into<OsString> + Clone,
    C: ClusterConnector,
    L: MockServerLauncher,
    F: FnOnce(&RunConfig) -> L,
    S: TestSuite,
{
    let config = match RunConfig::from_args(args) {
        Ok(config) => config,
        Err(HarnessError::Cli(e)) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(HarnessError::Cli(e).exit_code()),
            };
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = init_tracing(&config.log_settings()) {
        eprintln!("Logging already initialised: {e}");
    }

    let counter = match RuntimeTaskCounter::current() {
        Ok(counter) => counter,
        Err(e) => {
            log_error(RunStage::LeakCheck, "Task counter setup", &e);
            return ExitCode::from(e.exit_code());
        }
    };

    let driver = RunDriver::new(connector, make_launcher(&config), counter);
    match driver.run(&config, &suite).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            log_error(failed_stage(&e), "Run", &e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Entry point for a suite binary
///
/// Loads `.env`, reads the process arguments and starts mocks from the
/// configured or downloaded jar.
pub async fn run_main<C, S>(connector: C, suite: S) -> ExitCode
where
    C: ClusterConnector,
    S: TestSuite,
{
    dotenv::dotenv().ok();
    run_with_args(std::env::args_os(), connector, RealMockLauncher::from_config, suite).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupStep;
    use tokio::time::Instant;

    fn report(before: usize, after: usize) -> LeakReport {
        let now = Instant::now();
        LeakReport {
            baseline: LeakSample {
                task_count: before,
                taken_at: now,
            },
            final_sample: LeakSample {
                task_count: after,
                taken_at: now,
            },
            leaked: before != after,
            polls: 1,
        }
    }

    #[test]
    fn test_exit_code_passes_suite_status_through() {
        let outcome = RunOutcome {
            suite_status: 0,
            leak: report(5, 5),
        };
        assert_eq!(outcome.exit_code(), 0);

        let outcome = RunOutcome {
            suite_status: 101,
            leak: report(5, 5),
        };
        assert_eq!(outcome.exit_code(), 101);
    }

    #[test]
    fn test_leak_overrides_suite_status() {
        let outcome = RunOutcome {
            suite_status: 0,
            leak: report(5, 6),
        };
        assert_eq!(outcome.exit_code(), EXIT_LEAK);
    }

    #[test]
    fn test_out_of_range_status_is_a_failure() {
        let outcome = RunOutcome {
            suite_status: -1,
            leak: report(5, 5),
        };
        assert_eq!(outcome.exit_code(), EXIT_LEAK);
    }

    #[test]
    fn test_failed_stage() {
        assert_eq!(failed_stage(&HarnessError::configuration("x")), RunStage::Config);
        assert_eq!(
            failed_stage(&HarnessError::setup(SetupStep::Connect, "refused")),
            RunStage::Resolve
        );
        assert_eq!(failed_stage(&HarnessError::teardown("mock", "gone")), RunStage::Teardown);
    }
}
