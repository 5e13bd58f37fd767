//! Provisioning cache
//!
//! The installed opam root is cached under a key derived from the host and
//! the requested Rocq version. A hit lets the run skip acquiring opam and
//! building the compiler switch.
//!
//! # Key ordering
//!
//! | Order | Candidate | Example |
//! |-------|-----------|---------|
//! | 1 | exact key | `setup-rocq-v1-linux-x86_64-rocq-8.20.0` |
//! | 2 | same component | `setup-rocq-v1-linux-x86_64-rocq-` |
//! | 3 | same host | `setup-rocq-v1-linux-x86_64-` |
//!
//! The first candidate that matches wins; partial hits are never merged.

pub mod gateway;
pub mod identity;
pub mod store;

pub use gateway::{CacheGateway, CacheMatch, CacheOutcome, CacheStore, SaveOutcome};
pub use identity::{compute_fallback_prefixes, compute_key, CacheIdentity};
pub use store::{create_store, DisabledStore, LocalStore};

use crate::config::Config;
use crate::platform::Platform;
use std::path::PathBuf;

/// Paths saved and restored for a run on `platform`
pub fn cache_paths(config: &Config, platform: &Platform) -> Vec<PathBuf> {
    // The opam binary must come back with its root, since a hit skips acquiring it
    let mut paths = vec![config.toolchain.opam_root(), config.toolchain.tool_dir()];

    // apt archives and lists make the system package step cheap on a hit
    if platform.is_linux() {
        paths.push(PathBuf::from("/var/cache/apt/archives"));
        paths.push(PathBuf::from("/var/lib/apt/lists"));
    }

    paths.extend(config.cache.extra_paths.iter().cloned());
    paths
}
