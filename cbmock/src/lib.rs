//! Wrapper around the CouchbaseMock cluster process
//!
//! The mock is an external Java process. This crate locates (and if needed
//! downloads) its jar, starts it with a requested topology, speaks its
//! line-delimited JSON control protocol and shuts it down again.

pub mod command;
pub mod error;
pub mod jar;
pub mod process;
pub mod spec;

pub use command::{MockCommand, MockResponse};
pub use error::{MockError, MockResult};
pub use jar::{DEFAULT_MOCK_VERSION, JarLocator};
pub use process::CouchbaseMock;
pub use spec::{BucketSpec, BucketType, MockSpec, MockTopology};
