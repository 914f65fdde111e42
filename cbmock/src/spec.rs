//! Topology and bucket description used to start a mock cluster

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketType {
    Couchbase,
    Memcached,
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketType::Couchbase => write!(f, "couchbase"),
            BucketType::Memcached => write!(f, "memcache"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    pub password: String,
    pub bucket_type: BucketType,
}

impl BucketSpec {
    pub fn couchbase(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: String::new(),
            bucket_type: BucketType::Couchbase,
        }
    }

    /// Render as the mock's `name:password:type` bucket argument
    pub fn to_arg(&self) -> String {
        format!("{}:{}:{}", self.name, self.password, self.bucket_type)
    }
}

/// Cluster shape of the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockTopology {
    pub nodes: u32,
    pub replicas: u32,
    pub vbuckets: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockSpec {
    pub topology: MockTopology,
    pub buckets: Vec<BucketSpec>,
}

impl MockSpec {
    pub fn new(topology: MockTopology, buckets: Vec<BucketSpec>) -> Self {
        Self { topology, buckets }
    }

    /// Command-line arguments passed to the mock jar, excluding the monitor address
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--port=0".to_string(),
            format!("--nodes={}", self.topology.nodes),
            format!("--replicas={}", self.topology.replicas),
            format!("--vbuckets={}", self.topology.vbuckets),
        ];

        if !self.buckets.is_empty() {
            let buckets = self.buckets.iter().map(BucketSpec::to_arg).collect::<Vec<_>>().join(",");
            args.push(format!("--buckets={buckets}"));
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_arg() {
        assert_eq!(BucketSpec::couchbase("default").to_arg(), "default::couchbase");
        let memcached = BucketSpec {
            name: "cache".to_string(),
            password: "secret".to_string(),
            bucket_type: BucketType::Memcached,
        };
        assert_eq!(memcached.to_arg(), "cache:secret:memcache");
    }

    #[test]
    fn test_spec_args() {
        let spec = MockSpec::new(
            MockTopology {
                nodes: 4,
                replicas: 1,
                vbuckets: 64,
            },
            vec![BucketSpec::couchbase("default"), BucketSpec::couchbase("other")],
        );

        assert_eq!(
            spec.to_args(),
            vec![
                "--port=0",
                "--nodes=4",
                "--replicas=1",
                "--vbuckets=64",
                "--buckets=default::couchbase,other::couchbase",
            ]
        );
    }
}
