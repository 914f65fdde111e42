//! Test data shared by the integration tests

use harness::RunConfig;
use harness::core::features::parse_feature_directives;

pub struct TestFixtures;

impl TestFixtures {
    pub const SERVER: &'static str = "couchbase://10.112.0.1";
    pub const USERNAME: &'static str = "Administrator";
    pub const PASSWORD: &'static str = "s3cret";
    pub const SERVER_VERSION: &'static str = "7.2.0-5325-enterprise";

    pub const MOCK_VERSION: &'static str = "1.5.25";
    pub const MOCK_PORTS: [u16; 4] = [11210, 11211, 11212, 11213];
    pub const MOCK_CONNECTION_STRING: &'static str =
        "couchbase://127.0.0.1:11210,127.0.0.1:11211,127.0.0.1:11212,127.0.0.1:11213";

    /// Live tasks before the environment exists
    pub const BASELINE_TASKS: usize = 12;

    /// Configuration targeting a real cluster
    pub fn real_config() -> RunConfig {
        RunConfig::default()
            .with_server(Self::SERVER)
            .with_credentials(Self::USERNAME, Self::PASSWORD)
            .with_version(Self::SERVER_VERSION)
            .with_features(parse_feature_directives("+txn,-query").unwrap())
    }

    /// Configuration that starts a mock
    pub fn mock_config() -> RunConfig {
        RunConfig::default()
    }

    pub fn offline_config() -> RunConfig {
        RunConfig::default().with_offline(true)
    }
}
