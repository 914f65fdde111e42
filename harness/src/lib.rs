//! Process-lifecycle orchestration for client integration-test runs
//!
//! A run resolves its target environment (a real cluster, or a locally
//! started mock when no server is configured), hands a shared [`Fixture`] to
//! the test suite, tears the environment down again and finally checks that
//! the suite did not leave background tasks behind.
//!
//! A suite binary (a `harness = false` test target) typically calls
//! [`run_main`] with its client connector and its suite:
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     harness::run_main(MyConnector::default(), MySuite::default()).await
//! }
//! ```

pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod resolver;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::RunConfig;
pub use crate::core::{FeatureCode, FeatureDirective, Fixture, LeakPolicy, LeakReport, LeakSample};
pub use driver::{RunDriver, RunOutcome, run_main, run_with_args};
pub use error::{HarnessError, HarnessResult, SetupStep};
pub use resolver::{EnvironmentResolver, MockHandle, ResolvedEnvironment};
pub use services::{RealMockLauncher, RuntimeTaskCounter, TestMeter, TestTracer};
pub use traits::{
    BucketHandle, ClusterConnector, ClusterHandle, ClusterOptions, CollectionHandle, MockServer, MockServerLauncher,
    PasswordAuthenticator, ScopeHandle, TaskCounter, TestSuite,
};
