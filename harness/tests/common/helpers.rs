//! Builders and helpers to keep the integration tests short

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use harness::traits::{
    MockBucketHandle, MockClusterConnector, MockClusterHandle, MockCollectionHandle, MockMockServer,
    MockMockServerLauncher, MockScopeHandle, MockTaskCounter,
};
use harness::{BucketHandle, CollectionHandle, Fixture, LeakPolicy, RunDriver, ScopeHandle, TestSuite};
use shared::BackendMode;

use super::fixtures::TestFixtures;

pub type TestDriver = RunDriver<MockClusterConnector, MockMockServerLauncher, MockTaskCounter>;

/// Builder for run drivers over mocked collaborators
///
/// Connector and launcher start without expectations, so any call the test
/// did not ask for fails it.
pub struct DriverBuilder {
    connector: MockClusterConnector,
    launcher: MockMockServerLauncher,
    task_counts: Vec<usize>,
    policy: LeakPolicy,
}

impl DriverBuilder {
    pub fn new() -> Self {
        Self {
            connector: MockClusterConnector::new(),
            launcher: MockMockServerLauncher::new(),
            task_counts: vec![TestFixtures::BASELINE_TASKS],
            policy: LeakPolicy::default(),
        }
    }

    /// Configure the connector mock with a setup function
    pub fn with_connector<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockClusterConnector),
    {
        setup(&mut self.connector);
        self
    }

    /// Configure the launcher mock with a setup function
    pub fn with_launcher<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockMockServerLauncher),
    {
        setup(&mut self.launcher);
        self
    }

    /// Task counts in sampling order; the first is the baseline and the last repeats
    pub fn with_task_counts(mut self, counts: Vec<usize>) -> Self {
        self.task_counts = counts;
        self
    }

    pub fn with_policy(mut self, policy: LeakPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Connector answering every connect with a fresh cluster that expects one close
    pub fn with_connected_cluster(self) -> Self {
        self.with_connector(|connector| {
            connector
                .expect_connect()
                .times(1)
                .returning(|_, _| Ok(Arc::new(TestHelpers::cluster("default"))));
        })
    }

    /// Launcher starting a healthy mock that expects one close
    pub fn with_running_mock(self) -> Self {
        self.with_launcher(|launcher| {
            launcher
                .expect_start()
                .times(1)
                .returning(|_| Ok(Box::new(TestHelpers::mock_server())));
        })
    }

    pub fn build(self) -> TestDriver {
        RunDriver::new(
            self.connector,
            self.launcher,
            TestHelpers::scripted_counter(&self.task_counts),
        )
        .with_policy(self.policy)
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What the suite saw of its fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenFixture {
    pub mode: BackendMode,
    pub bucket: String,
    pub connection_string: String,
    pub version: String,
    pub is_mock_version: bool,
    pub transactions: bool,
    pub query: bool,
}

/// Suite that records its fixture and returns a fixed status
pub struct RecordingSuite {
    status: i32,
    runs: Mutex<Vec<Option<SeenFixture>>>,
    args: Mutex<Vec<Vec<String>>>,
}

impl RecordingSuite {
    pub fn returning(status: i32) -> Self {
        Self {
            status,
            runs: Mutex::new(Vec::new()),
            args: Mutex::new(Vec::new()),
        }
    }

    pub fn runs(&self) -> Vec<Option<SeenFixture>> {
        self.runs.lock().unwrap().clone()
    }

    /// Arguments passed to each run
    pub fn args(&self) -> Vec<Vec<String>> {
        self.args.lock().unwrap().clone()
    }

    /// The fixture of the only run
    pub fn seen(&self) -> Option<SeenFixture> {
        let runs = self.runs();
        assert_eq!(runs.len(), 1, "suite should run exactly once");
        runs.into_iter().next().flatten()
    }
}

#[async_trait]
impl TestSuite for RecordingSuite {
    async fn run(&self, fixture: Option<&Fixture>, args: &[String]) -> i32 {
        let seen = fixture.map(|fixture| SeenFixture {
            mode: fixture.mode,
            bucket: fixture.bucket_name(),
            connection_string: fixture.connection_string.clone(),
            version: fixture.version.to_string(),
            is_mock_version: fixture.version.is_mock,
            transactions: fixture.supports_feature("txn"),
            query: fixture.supports_feature("query"),
        });
        self.runs.lock().unwrap().push(seen);
        self.args.lock().unwrap().push(args.to_vec());
        self.status
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Cluster whose bucket, default scope and default collection resolve locally
    pub fn cluster(bucket_name: &str) -> MockClusterHandle {
        Self::cluster_closing_with(bucket_name, || Ok(()))
    }

    /// Like [`TestHelpers::cluster`], with `close` answered by `on_close`
    pub fn cluster_closing_with<F>(bucket_name: &str, on_close: F) -> MockClusterHandle
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        let mut collection = MockCollectionHandle::new();
        collection.expect_name().return_const("_default".to_string());
        collection.expect_scope_name().return_const("_default".to_string());
        let collection: Arc<dyn CollectionHandle> = Arc::new(collection);

        let mut scope = MockScopeHandle::new();
        scope.expect_name().return_const("_default".to_string());
        scope.expect_default_collection().returning(move || collection.clone());
        let scope: Arc<dyn ScopeHandle> = Arc::new(scope);

        let mut bucket = MockBucketHandle::new();
        bucket.expect_name().return_const(bucket_name.to_string());
        bucket.expect_default_scope().returning(move || scope.clone());
        let bucket: Arc<dyn BucketHandle> = Arc::new(bucket);

        let mut cluster = MockClusterHandle::new();
        cluster.expect_bucket().returning(move |_| bucket.clone());
        cluster.expect_close().times(1).returning(on_close);
        cluster
    }

    /// Healthy mock on the standard ports that expects exactly one close
    pub fn mock_server() -> MockMockServer {
        let mut server = MockMockServer::new();
        server
            .expect_data_ports()
            .return_const(TestFixtures::MOCK_PORTS.to_vec());
        server
            .expect_version()
            .return_const(TestFixtures::MOCK_VERSION.to_string());
        server.expect_control().times(2).returning(|_| Ok(()));
        server.expect_close().times(1).returning(|| Ok(()));
        server
    }

    /// Counter replaying `counts` in order, then repeating the last one
    pub fn scripted_counter(counts: &[usize]) -> MockTaskCounter {
        let last = counts.last().copied().unwrap_or(0);
        let queue = Mutex::new(counts.iter().copied().collect::<VecDeque<_>>());

        let mut counter = MockTaskCounter::new();
        counter.expect_live_tasks().returning(move || {
            let mut queue = queue.lock().unwrap();
            if queue.len() > 1 { queue.pop_front().unwrap() } else { last }
        });
        counter
            .expect_dump()
            .returning(|| "alive tasks: scripted".to_string());
        counter
    }
}
