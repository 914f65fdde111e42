//! Trait definitions with mockall annotations for testing
//!
//! The harness never looks inside the client under test or the mock process.
//! Both are reached through the traits below, which keeps environment
//! resolution and teardown testable with generated mocks.

use std::sync::Arc;

use async_trait::async_trait;
use cbmock::{MockCommand, MockSpec};

use crate::core::Fixture;
use crate::services::{TestMeter, TestTracer};

/// Username/password credentials handed to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordAuthenticator {
    pub username: String,
    pub password: String,
}

impl PasswordAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Options passed to the client's connect call
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub authenticator: PasswordAuthenticator,
    pub tracer: Arc<TestTracer>,
    pub meter: Arc<TestMeter>,
}

/// Entry point of the client under test
#[mockall::automock]
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    /// Connect to the cluster behind `connection_string`; blocks until connected or failed
    async fn connect(&self, connection_string: &str, options: ClusterOptions) -> anyhow::Result<Arc<dyn ClusterHandle>>;
}

/// A connected cluster
#[mockall::automock]
#[async_trait]
pub trait ClusterHandle: Send + Sync {
    /// Local lookup of a bucket handle; performs no network call
    fn bucket(&self, name: &str) -> Arc<dyn BucketHandle>;

    /// Release every connection and background task owned by the cluster
    async fn close(&self) -> anyhow::Result<()>;
}

#[mockall::automock]
pub trait BucketHandle: Send + Sync {
    fn name(&self) -> String;
    fn scope(&self, name: &str) -> Arc<dyn ScopeHandle>;
    fn default_scope(&self) -> Arc<dyn ScopeHandle>;
}

#[mockall::automock]
pub trait ScopeHandle: Send + Sync {
    fn name(&self) -> String;
    fn collection(&self, name: &str) -> Arc<dyn CollectionHandle>;
    fn default_collection(&self) -> Arc<dyn CollectionHandle>;
}

#[mockall::automock]
pub trait CollectionHandle: Send + Sync {
    fn name(&self) -> String;
    fn scope_name(&self) -> String;
}

/// Starts mock cluster processes
#[mockall::automock]
#[async_trait]
pub trait MockServerLauncher: Send + Sync {
    /// Start a mock with the given topology; blocks until the mock is ready
    async fn start(&self, spec: MockSpec) -> anyhow::Result<Box<dyn MockServer>>;
}

/// A running mock cluster process
#[mockall::automock]
#[async_trait]
pub trait MockServer: Send + Sync {
    async fn control(&self, command: MockCommand) -> anyhow::Result<()>;

    /// Version string the mock reports for itself
    fn version(&self) -> String;

    /// Data-service ports, one per mock node
    fn data_ports(&self) -> Vec<u16>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Source of the live concurrent-task count
#[mockall::automock]
pub trait TaskCounter: Send + Sync {
    fn live_tasks(&self) -> usize;

    /// Human-readable snapshot of the live tasks, written out when a leak is detected
    fn dump(&self) -> String;
}

/// The test suite driven by a run
///
/// Receives the fixture when an environment was resolved (`None` in offline
/// mode) and the arguments given after `--`, and returns the suite's own exit
/// status.
#[async_trait]
pub trait TestSuite: Send + Sync {
    async fn run(&self, fixture: Option<&Fixture>, args: &[String]) -> i32;
}
