//! Requested Rocq version
//!
//! The raw input is resolved once into a closed variant so later branches
//! match on the variant instead of comparing strings.

use crate::error::SetupError;
use std::fmt;
use std::str::FromStr;

/// Which Rocq release to provision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RocqVersion {
    /// Development heads pinned from git
    Dev,
    /// Latest release in the opam repository
    #[default]
    Latest,
    /// An exact opam package version, e.g. `8.20.0`
    Specific(String),
}

impl RocqVersion {
    /// Segment used in the cache key
    pub fn key_segment(&self) -> &str {
        match self {
            Self::Dev => "dev",
            Self::Latest => "latest",
            Self::Specific(v) => v,
        }
    }
}

impl FromStr for RocqVersion {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" | "latest" => Ok(Self::Latest),
            "dev" => Ok(Self::Dev),
            v if v
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '~')) =>
            {
                Ok(Self::Specific(v.to_string()))
            }
            other => Err(SetupError::InvalidVersion(other.to_string())),
        }
    }
}

impl fmt::Display for RocqVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_segment())
    }
}
