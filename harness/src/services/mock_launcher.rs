//! Launcher backed by the CouchbaseMock process

use async_trait::async_trait;
use cbmock::{CouchbaseMock, JarLocator, MockCommand, MockSpec};

use crate::config::RunConfig;
use crate::traits::{MockServer, MockServerLauncher};

/// Starts real mock processes from a located jar
#[derive(Debug, Clone, Default)]
pub struct RealMockLauncher {
    locator: JarLocator,
}

impl RealMockLauncher {
    pub fn new(locator: JarLocator) -> Self {
        Self { locator }
    }

    /// Launcher honouring the configured jar path, if any
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(JarLocator::new().with_explicit_path(config.mock_path.clone()))
    }

    pub fn locator(&self) -> &JarLocator {
        &self.locator
    }
}

#[async_trait]
impl MockServerLauncher for RealMockLauncher {
    async fn start(&self, spec: MockSpec) -> anyhow::Result<Box<dyn MockServer>> {
        let mock = CouchbaseMock::start(&self.locator, &spec).await?;
        Ok(Box::new(mock))
    }
}

#[async_trait]
impl MockServer for CouchbaseMock {
    async fn control(&self, command: MockCommand) -> anyhow::Result<()> {
        CouchbaseMock::control(self, &command).await?;
        Ok(())
    }

    fn version(&self) -> String {
        CouchbaseMock::version(self).to_string()
    }

    fn data_ports(&self) -> Vec<u16> {
        CouchbaseMock::data_ports(self).to_vec()
    }

    async fn close(&self) -> anyhow::Result<()> {
        CouchbaseMock::close(self).await?;
        Ok(())
    }
}
