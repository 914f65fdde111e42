//! Feature directive parsing
//!
//! A directive string such as `+txn,-query` toggles named capabilities for a
//! run. Identifiers are opaque here; deciding what a feature means is up to
//! whoever consults the directives.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HarnessError, HarnessResult};

/// Feature codes with built-in capability knowledge
pub mod codes {
    pub const KEY_VALUE: &str = "kv";
    pub const SUBDOC: &str = "subdoc";
    pub const XATTRS: &str = "xattrs";
    pub const EXPAND_MACROS: &str = "expandmacros";
    pub const REPLICAS: &str = "replicas";
    pub const QUERY: &str = "query";
    pub const SEARCH: &str = "search";
    pub const ANALYTICS: &str = "analytics";
    pub const DURABILITY: &str = "durability";
    pub const COLLECTIONS: &str = "collections";
    pub const TRANSACTIONS: &str = "txn";
    pub const PRESERVE_EXPIRY: &str = "preserveexpiry";

    /// Matches every feature
    pub const WILDCARD: &str = "*";
}

const DELIMITER: &str = ",";

/// Name of a capability a test may depend on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureCode(String);

impl FeatureCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == codes::WILDCARD
    }

    /// Whether a directive for `self` applies to `other`
    pub fn matches(&self, other: &str) -> bool {
        self.is_wildcard() || self.0 == other
    }
}

impl fmt::Display for FeatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeatureCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDirective {
    pub feature: FeatureCode,
    pub enabled: bool,
}

impl FeatureDirective {
    pub fn enable(feature: impl Into<FeatureCode>) -> Self {
        Self {
            feature: feature.into(),
            enabled: true,
        }
    }

    pub fn disable(feature: impl Into<FeatureCode>) -> Self {
        Self {
            feature: feature.into(),
            enabled: false,
        }
    }

    /// Parse a single non-empty `+name` / `-name` token
    pub fn parse(token: &str) -> HarnessResult<Self> {
        if let Some(feature) = token.strip_prefix('+') {
            Ok(Self::enable(feature))
        } else if let Some(feature) = token.strip_prefix('-') {
            Ok(Self::disable(feature))
        } else {
            Err(HarnessError::InvalidFeatureDirective {
                token: token.to_string(),
            })
        }
    }
}

impl fmt::Display for FeatureDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.enabled { '+' } else { '-' };
        write!(f, "{sign}{}", self.feature)
    }
}

/// Parse a comma-separated directive string
///
/// Empty tokens are skipped. Order is preserved and repeated identifiers are
/// all kept. A token without a sign fails the whole parse.
pub fn parse_feature_directives(raw: &str) -> HarnessResult<Vec<FeatureDirective>> {
    raw.split(DELIMITER)
        .filter(|token| !token.is_empty())
        .map(FeatureDirective::parse)
        .collect()
}

/// Render directives back into the `+a,-b` form
pub fn serialize_feature_directives(directives: &[FeatureDirective]) -> String {
    directives
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

/// Resolve the effective toggle for `feature`; the last matching directive wins
pub fn resolve_directive(directives: &[FeatureDirective], feature: &str) -> Option<bool> {
    directives
        .iter()
        .rev()
        .find(|directive| directive.feature.matches(feature))
        .map(|directive| directive.enabled)
}
