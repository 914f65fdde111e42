//! Server version descriptor
//!
//! Tests use the descriptor to skip behaviour the backend under test does not
//! offer. It is parsed once per run and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Edition of the server build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeEdition {
    #[default]
    Unspecified,
    Enterprise,
    Community,
}

impl fmt::Display for NodeEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeEdition::Unspecified => write!(f, "unspecified"),
            NodeEdition::Enterprise => write!(f, "enterprise"),
            NodeEdition::Community => write!(f, "community"),
        }
    }
}

/// Parsed server version, tagged with whether the backend is a mock
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
    pub edition: NodeEdition,
    pub modifier: Option<String>,
    pub is_mock: bool,
}

impl NodeVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            ..Self::default()
        }
    }

    /// Parse `MAJOR[.MINOR[.PATCH]][-BUILD][-EDITION|MODIFIER]`.
    ///
    /// The dotted form `MAJOR.MINOR.PATCH.BUILD_EDITION` is accepted as well.
    pub fn parse(input: &str, is_mock: bool) -> SharedResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SharedError::invalid_version(input, "version string is empty"));
        }

        let mut segments = trimmed.split('-');
        let head = segments.next().unwrap_or_default();
        let mut version = NodeVersion {
            is_mock,
            ..NodeVersion::default()
        };
        let mut build_seen = false;

        let dotted: Vec<&str> = head.split('.').collect();
        if dotted.len() > 4 {
            return Err(SharedError::invalid_version(input, "too many dotted components"));
        }
        for (position, part) in dotted.iter().enumerate() {
            match position {
                0 => version.major = parse_number(input, part, "major")?,
                1 => version.minor = parse_number(input, part, "minor")?,
                2 => version.patch = parse_number(input, part, "patch")?,
                _ => {
                    let (build, edition) = match part.split_once('_') {
                        Some((build, edition)) => (build, Some(edition)),
                        None => (*part, None),
                    };
                    version.build = parse_number(input, build, "build")?;
                    build_seen = true;
                    if let Some(edition) = edition {
                        version.apply_suffix(input, edition)?;
                    }
                }
            }
        }

        for segment in segments {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                if build_seen {
                    return Err(SharedError::invalid_version(input, "build number given twice"));
                }
                version.build = parse_number(input, segment, "build")?;
                build_seen = true;
            } else {
                version.apply_suffix(input, segment)?;
            }
        }

        Ok(version)
    }

    fn apply_suffix(&mut self, input: &str, suffix: &str) -> SharedResult<()> {
        if suffix.is_empty() {
            return Err(SharedError::invalid_version(input, "empty version suffix"));
        }
        match suffix.to_ascii_lowercase().as_str() {
            "enterprise" => self.edition = NodeEdition::Enterprise,
            "community" => self.edition = NodeEdition::Community,
            other => {
                self.modifier = Some(match self.modifier.take() {
                    Some(existing) => format!("{existing}-{other}"),
                    None => other.to_string(),
                });
            }
        }
        Ok(())
    }

    fn release(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// Compare release numbers only; build, edition and mock flag are ignored
    pub fn compare(&self, other: &NodeVersion) -> Ordering {
        self.release().cmp(&other.release())
    }

    pub fn equal(&self, other: &NodeVersion) -> bool {
        self.compare(other) == Ordering::Equal
    }

    pub fn higher(&self, other: &NodeVersion) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub fn lower(&self, other: &NodeVersion) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn at_least(&self, other: &NodeVersion) -> bool {
        !self.lower(other)
    }
}

fn parse_number(input: &str, part: &str, component: &str) -> SharedResult<u32> {
    part.parse::<u32>()
        .map_err(|_| SharedError::invalid_version(input, format!("{component} component '{part}' is not a number")))
}

impl fmt::Display for NodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.build > 0 {
            write!(f, "-{}", self.build)?;
        }
        if self.edition != NodeEdition::Unspecified {
            write!(f, "-{}", self.edition)?;
        }
        if let Some(ref modifier) = self.modifier {
            write!(f, "-{modifier}")?;
        }
        if self.is_mock {
            write!(f, " (mock)")?;
        }
        Ok(())
    }
}
