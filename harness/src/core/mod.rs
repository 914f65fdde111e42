//! Core harness logic
//!
//! Feature directives, the shared fixture, and the task leak sentinel.

pub mod features;
pub mod fixture;
pub mod sentinel;

pub use features::{FeatureCode, FeatureDirective, parse_feature_directives, serialize_feature_directives};
pub use fixture::Fixture;
pub use sentinel::{LeakPolicy, LeakReport, LeakSample, detect_leak};
