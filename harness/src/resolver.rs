//! Environment resolution
//!
//! Turns a [`RunConfig`] into a connected [`Fixture`]. With a server address
//! the caller's cluster is used as is; without one a mock cluster is started
//! and the client is pointed at it. Every failure is fatal, and whatever was
//! opened before the failure is closed again before returning.

use std::sync::Arc;

use cbmock::{BucketSpec, MockCommand, MockSpec, MockTopology};
use shared::{BackendMode, NodeVersion, RunStage};
use shared::{stage_debug, stage_info, stage_warn};

use crate::config::RunConfig;
use crate::core::Fixture;
use crate::error::{HarnessError, HarnessResult, SetupStep};
use crate::services::{TestMeter, TestTracer};
use crate::traits::{ClusterConnector, ClusterHandle, ClusterOptions, MockServer, MockServerLauncher, PasswordAuthenticator};

/// Mock cluster shape: small, but with several nodes
pub const MOCK_TOPOLOGY: MockTopology = MockTopology {
    nodes: 4,
    replicas: 1,
    vbuckets: 64,
};
pub const MOCK_BUCKET: &str = "default";
pub const MOCK_USERNAME: &str = "Administrator";
pub const MOCK_PASSWORD: &str = "password";
/// The only SASL mechanism the mock is allowed to offer
pub const MOCK_SASL_MECHANISM: &str = "SCRAM-SHA512";
/// Version assumed for a real cluster when none is configured
pub const DEFAULT_SERVER_VERSION: &str = "5.0.0";

/// A mock cluster owned by the run
pub struct MockHandle {
    server: Box<dyn MockServer>,
    endpoints: Vec<String>,
}

impl MockHandle {
    pub fn new(server: Box<dyn MockServer>) -> Self {
        let endpoints = server
            .data_ports()
            .iter()
            .map(|port| format!("127.0.0.1:{port}"))
            .collect();
        Self { server, endpoints }
    }

    /// `host:port` of every data-service node
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn connection_string(&self) -> String {
        format!("couchbase://{}", self.endpoints.join(","))
    }

    pub fn version(&self) -> String {
        self.server.version()
    }

    pub async fn control(&self, command: MockCommand) -> HarnessResult<()> {
        let name = command.name();
        self.server
            .control(command)
            .await
            .map_err(|e| HarnessError::setup(SetupStep::MockControl, format!("{name}: {e}")))
    }

    pub async fn close(self) -> HarnessResult<()> {
        self.server.close().await.map_err(|e| HarnessError::teardown("mock", e))
    }
}

/// A resolved environment: the fixture plus the mock backing it, if any
pub struct ResolvedEnvironment {
    pub fixture: Fixture,
    pub mock: Option<MockHandle>,
}

impl ResolvedEnvironment {
    /// Close the cluster, then the mock
    ///
    /// The mock is closed even when closing the cluster failed; the first
    /// failure is returned.
    pub async fn close(self) -> HarnessResult<()> {
        let cluster_result = self
            .fixture
            .cluster
            .close()
            .await
            .map_err(|e| HarnessError::teardown("cluster", e));
        drop(self.fixture);

        let mock_result = match self.mock {
            Some(mock) => mock.close().await,
            None => Ok(()),
        };

        cluster_result.and(mock_result)
    }
}

struct Target {
    connection_string: String,
    authenticator: PasswordAuthenticator,
    bucket: String,
    version: String,
}

pub struct EnvironmentResolver<C, L> {
    connector: C,
    launcher: L,
}

impl<C, L> EnvironmentResolver<C, L>
where
    C: ClusterConnector,
    L: MockServerLauncher,
{
    pub fn new(connector: C, launcher: L) -> Self {
        Self { connector, launcher }
    }

    /// Build the fixture for `config`, starting a mock when no server is set
    pub async fn resolve(&self, config: &RunConfig) -> HarnessResult<ResolvedEnvironment> {
        let mode = config.mode();
        if mode == BackendMode::Mock && config.version.is_some() {
            return Err(HarnessError::configuration("version cannot be specified with mock"));
        }
        stage_info!(RunStage::Resolve, mode = %mode, "Resolving {} environment", mode);

        let (target, mock) = match mode {
            BackendMode::Mock => {
                let mock = self.start_mock().await?;
                let target = Target {
                    connection_string: mock.connection_string(),
                    authenticator: PasswordAuthenticator::new(MOCK_USERNAME, MOCK_PASSWORD),
                    bucket: MOCK_BUCKET.to_string(),
                    version: mock.version(),
                };
                (target, Some(mock))
            }
            BackendMode::Real => {
                let target = Target {
                    connection_string: config.server.clone(),
                    authenticator: PasswordAuthenticator::new(&config.username, &config.password),
                    bucket: config.bucket.clone(),
                    version: config
                        .version
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SERVER_VERSION.to_string()),
                };
                (target, None)
            }
        };

        match self.assemble(config, mode, target).await {
            Ok(fixture) => {
                stage_info!(
                    RunStage::Resolve,
                    connection_string = %fixture.connection_string,
                    version = %fixture.version,
                    "Environment ready: bucket {}",
                    fixture.bucket_name()
                );
                Ok(ResolvedEnvironment { fixture, mock })
            }
            Err(e) => {
                if let Some(mock) = mock {
                    close_after_failure(mock).await;
                }
                Err(e)
            }
        }
    }

    async fn start_mock(&self) -> HarnessResult<MockHandle> {
        let spec = MockSpec::new(MOCK_TOPOLOGY, vec![BucketSpec::couchbase(MOCK_BUCKET)]);
        stage_debug!(RunStage::Resolve, "Starting mock with {:?}", spec.topology);

        let server = self
            .launcher
            .start(spec)
            .await
            .map_err(|e| HarnessError::setup(SetupStep::MockStart, e))?;
        let mock = MockHandle::new(server);

        if mock.endpoints().is_empty() {
            close_after_failure(mock).await;
            return Err(HarnessError::setup(SetupStep::MockStart, "mock reported no data ports"));
        }

        let commands = [
            MockCommand::SetCccp { enabled: true },
            MockCommand::SetSaslMechanisms {
                mechanisms: vec![MOCK_SASL_MECHANISM.to_string()],
            },
        ];
        for command in commands {
            if let Err(e) = mock.control(command).await {
                close_after_failure(mock).await;
                return Err(e);
            }
        }

        stage_info!(RunStage::Resolve, "Mock {} started at {}", mock.version(), mock.connection_string());
        Ok(mock)
    }

    /// Connect, parse the version and derive the handles
    async fn assemble(&self, config: &RunConfig, mode: BackendMode, target: Target) -> HarnessResult<Fixture> {
        let tracer = Arc::new(TestTracer::new());
        let meter = Arc::new(TestMeter::new());
        let options = ClusterOptions {
            authenticator: target.authenticator.clone(),
            tracer: Arc::clone(&tracer),
            meter: Arc::clone(&meter),
        };

        stage_debug!(RunStage::Resolve, "Connecting to {}", target.connection_string);
        let cluster = self
            .connector
            .connect(&target.connection_string, options)
            .await
            .map_err(|e| HarnessError::setup(SetupStep::Connect, e))?;

        let version = match NodeVersion::parse(&target.version, mode == BackendMode::Mock) {
            Ok(version) => version,
            Err(e) => {
                close_cluster_after_failure(cluster.as_ref()).await;
                return Err(HarnessError::setup(SetupStep::VersionParse, e));
            }
        };

        let bucket = cluster.bucket(&target.bucket);
        let scope = match config.scope {
            Some(ref name) => bucket.scope(name),
            None => bucket.default_scope(),
        };
        let collection = match config.collection {
            Some(ref name) => scope.collection(name),
            None => scope.default_collection(),
        };

        Ok(Fixture {
            cluster,
            bucket,
            scope,
            collection,
            version,
            features: config.features.clone(),
            tracer,
            meter,
            connection_string: target.connection_string,
            authenticator: target.authenticator,
            mode,
        })
    }
}

async fn close_after_failure(mock: MockHandle) {
    if let Err(e) = mock.close().await {
        stage_warn!(RunStage::Resolve, "Failed to close mock after setup failure: {}", e);
    }
}

async fn close_cluster_after_failure(cluster: &dyn ClusterHandle) {
    if let Err(e) = cluster.close().await {
        stage_warn!(RunStage::Resolve, "Failed to close cluster after setup failure: {}", e);
    }
}
