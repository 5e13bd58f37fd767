//! Host platform detection
//!
//! The values feed the cache key and pick the OS package manager, so they
//! are kept as plain names rather than validated against a fixed list.

use std::fmt;

/// Detected operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Linux - apt packages, cached apt archives
    Linux,
    /// macOS - Homebrew packages
    MacOS,
    /// Anything else, carried through by name
    Other(String),
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOS,
            other => Platform::Other(other.to_string()),
        }
    }

    /// Name used in cache keys and download URLs
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOS => "macos",
            Platform::Other(name) => name,
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, Platform::Linux)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture, as reported by `std::env::consts::ARCH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Architecture(String);

impl Architecture {
    pub fn detect() -> Self {
        Self(std::env::consts::ARCH.to_string())
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Architecture name used by opam release assets
    pub fn opam_asset_name(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "x86_64" => Some("x86_64"),
            "aarch64" => Some("arm64"),
            "x86" => Some("i686"),
            "arm" => Some("armhf"),
            "powerpc64" => Some("ppc64le"),
            "s390x" => Some("s390x"),
            _ => None,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
