//! Configuration schema for rocq-setup
//!
//! Configuration is stored at `~/.config/rocq-setup/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// opam toolchain settings
    pub toolchain: ToolchainConfig,

    /// Provisioning cache settings
    pub cache: CacheConfig,

    /// OS package lists
    pub packages: PackagesConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// opam toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// opam release to download
    pub opam_version: String,

    /// Base URL of opam release assets
    pub download_base_url: String,

    /// Switch name
    pub switch: String,

    /// Compiler package the switch is created with
    pub compiler: String,

    /// opam root (defaults to ~/.opam)
    pub opam_root: Option<PathBuf>,

    /// Directory the opam binary is installed into
    pub tool_dir: Option<PathBuf>,

    /// Pass --disable-sandboxing to opam init
    pub disable_sandboxing: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            opam_version: "2.3.0".to_string(),
            download_base_url: "https://github.com/ocaml/opam/releases/download".to_string(),
            switch: "default".to_string(),
            compiler: "ocaml-base-compiler.5.3.0".to_string(),
            opam_root: None,
            tool_dir: None,
            disable_sandboxing: false,
        }
    }
}

impl ToolchainConfig {
    /// Resolved opam root
    pub fn opam_root(&self) -> PathBuf {
        self.opam_root.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".opam")
        })
    }

    /// Resolved directory for the opam binary
    pub fn tool_dir(&self) -> PathBuf {
        self.tool_dir.clone().unwrap_or_else(|| {
            std::env::var_os("RUNNER_TOOL_CACHE")
                .map(PathBuf::from)
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rocq-setup")
                .join("opam")
                .join(&self.opam_version)
        })
    }
}

/// Provisioning cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the provisioning cache (default: true)
    pub enabled: bool,

    /// Bumped to invalidate every existing entry
    pub namespace_version: String,

    /// Directory holding cache archives
    pub dir: Option<PathBuf>,

    /// Extra paths saved alongside the opam root
    pub extra_paths: Vec<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace_version: "v1".to_string(),
            dir: None,
            extra_paths: vec![],
        }
    }
}

impl CacheConfig {
    /// Resolved store directory
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rocq-setup")
        })
    }
}

/// OS package configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// apt packages that must install
    pub linux_mandatory: Vec<String>,

    /// apt packages installed only when the index has them
    pub linux_optional: Vec<String>,

    /// Homebrew packages
    pub macos: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            linux_mandatory: owned(&[
                "bubblewrap",
                "musl-tools",
                "rsync",
                "libgmp-dev",
                "pkg-config",
            ]),
            linux_optional: owned(&["darcs", "g++-multilib", "gcc-multilib", "mercurial"]),
            macos: owned(&["darcs", "mercurial"]),
        }
    }
}
