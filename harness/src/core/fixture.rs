//! The environment handed to every test of a run

use std::fmt;
use std::sync::Arc;

use shared::{BackendMode, NodeVersion};

use crate::core::features::{FeatureDirective, codes, resolve_directive};
use crate::services::{TestMeter, TestTracer};
use crate::traits::{BucketHandle, ClusterHandle, CollectionHandle, PasswordAuthenticator, ScopeHandle};

/// Built-in capability knowledge: (feature, available on the mock, first server version)
const CAPABILITIES: &[(&str, bool, (u32, u32, u32))] = &[
    (codes::KEY_VALUE, true, (1, 0, 0)),
    (codes::SUBDOC, true, (4, 5, 0)),
    (codes::XATTRS, true, (5, 0, 0)),
    (codes::EXPAND_MACROS, true, (5, 0, 0)),
    (codes::REPLICAS, true, (1, 0, 0)),
    (codes::QUERY, false, (4, 0, 0)),
    (codes::SEARCH, false, (5, 0, 0)),
    (codes::ANALYTICS, false, (6, 0, 0)),
    (codes::DURABILITY, false, (6, 5, 0)),
    (codes::COLLECTIONS, false, (7, 0, 0)),
    (codes::TRANSACTIONS, false, (6, 6, 0)),
    (codes::PRESERVE_EXPIRY, false, (7, 0, 0)),
];

/// Shared, read-only environment for the suite
///
/// Built once per run after environment resolution and lent to the suite.
pub struct Fixture {
    pub cluster: Arc<dyn ClusterHandle>,
    pub bucket: Arc<dyn BucketHandle>,
    pub scope: Arc<dyn ScopeHandle>,
    pub collection: Arc<dyn CollectionHandle>,
    pub version: NodeVersion,
    pub features: Vec<FeatureDirective>,
    pub tracer: Arc<TestTracer>,
    pub meter: Arc<TestMeter>,
    pub connection_string: String,
    pub authenticator: PasswordAuthenticator,
    pub mode: BackendMode,
}

impl Fixture {
    pub fn is_mock(&self) -> bool {
        self.mode == BackendMode::Mock
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    pub fn scope_name(&self) -> String {
        self.scope.name()
    }

    pub fn collection_name(&self) -> String {
        self.collection.name()
    }

    /// Whether a test depending on `feature` should run against this backend
    ///
    /// An explicit directive decides first, the last matching one winning.
    /// Otherwise built-in knowledge of the backend applies; features it does
    /// not know about are unsupported.
    pub fn supports_feature(&self, feature: &str) -> bool {
        if let Some(enabled) = resolve_directive(&self.features, feature) {
            return enabled;
        }

        let Some((_, on_mock, (major, minor, patch))) =
            CAPABILITIES.iter().find(|(code, _, _)| *code == feature)
        else {
            return false;
        };

        if self.is_mock() {
            return *on_mock;
        }
        self.version.at_least(&NodeVersion::new(*major, *minor, *patch))
    }

    pub fn not_supports_feature(&self, feature: &str) -> bool {
        !self.supports_feature(feature)
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("connection_string", &self.connection_string)
            .field("username", &self.authenticator.username)
            .field("bucket", &self.bucket.name())
            .field("scope", &self.scope.name())
            .field("collection", &self.collection.name())
            .field("version", &self.version)
            .field("features", &self.features)
            .field("mode", &self.mode)
            .finish()
    }
}
