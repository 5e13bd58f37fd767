//! Cache identity derived from environment facts
//!
//! Keys look like `setup-rocq-v1-linux-x86_64-rocq-8.20.0`. Fallback
//! prefixes drop trailing segments so a near miss (same platform and
//! architecture, different Rocq version) can still seed the run.

use crate::platform::{Architecture, Platform};
use crate::version::RocqVersion;
use serde::Serialize;

/// Leading key segment
pub const KEY_TOOL: &str = "setup-rocq";
/// Segment naming the cached component
pub const KEY_COMPONENT: &str = "rocq";

/// Primary key for the given facts. Pure and deterministic.
pub fn compute_key(
    namespace_version: &str,
    platform: &str,
    architecture: &str,
    toolchain_version: &str,
) -> String {
    format!(
        "{}{}",
        component_prefix(namespace_version, platform, architecture),
        toolchain_version
    )
}

/// Fallback prefixes, most specific first.
///
/// Each is a prefix of every key computed for the same namespace, platform
/// and architecture; a strict one whenever the toolchain version is non-empty.
pub fn compute_fallback_prefixes(
    namespace_version: &str,
    platform: &str,
    architecture: &str,
) -> Vec<String> {
    vec![
        component_prefix(namespace_version, platform, architecture),
        host_prefix(namespace_version, platform, architecture),
    ]
}

fn host_prefix(namespace_version: &str, platform: &str, architecture: &str) -> String {
    format!(
        "{}-{}-{}-{}-",
        KEY_TOOL, namespace_version, platform, architecture
    )
}

fn component_prefix(namespace_version: &str, platform: &str, architecture: &str) -> String {
    format!(
        "{}{}-",
        host_prefix(namespace_version, platform, architecture),
        KEY_COMPONENT
    )
}

/// Facts identifying a reusable toolchain state. Computed once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheIdentity {
    pub namespace_version: String,
    pub platform: String,
    pub architecture: String,
    pub toolchain_version: String,
}

impl CacheIdentity {
    pub fn new(
        namespace_version: impl Into<String>,
        platform: impl Into<String>,
        architecture: impl Into<String>,
        toolchain_version: impl Into<String>,
    ) -> Self {
        Self {
            namespace_version: namespace_version.into(),
            platform: platform.into(),
            architecture: architecture.into(),
            toolchain_version: toolchain_version.into(),
        }
    }

    /// Identity for this host and the requested version
    pub fn for_host(namespace_version: &str, version: &RocqVersion) -> Self {
        Self::new(
            namespace_version,
            Platform::detect().as_str(),
            Architecture::detect().as_str(),
            version.key_segment(),
        )
    }

    pub fn key(&self) -> String {
        compute_key(
            &self.namespace_version,
            &self.platform,
            &self.architecture,
            &self.toolchain_version,
        )
    }

    pub fn fallback_prefixes(&self) -> Vec<String> {
        compute_fallback_prefixes(&self.namespace_version, &self.platform, &self.architecture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert_eq!(
            compute_key("v1", "linux", "x86_64", "8.20.0"),
            "setup-rocq-v1-linux-x86_64-rocq-8.20.0"
        );
    }

    #[test]
    fn key_is_deterministic() {
        let a = CacheIdentity::new("v1", "macos", "aarch64", "dev");
        let b = CacheIdentity::new("v1", "macos", "aarch64", "dev");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.fallback_prefixes(), b.fallback_prefixes());
    }

    #[test]
    fn distinct_fields_give_distinct_keys() {
        let base = ("v1", "linux", "x86_64", "latest");
        let variants = [
            ("v2", "linux", "x86_64", "latest"),
            ("v1", "macos", "x86_64", "latest"),
            ("v1", "linux", "aarch64", "latest"),
            ("v1", "linux", "x86_64", "dev"),
            ("v1", "linux", "x86_64", "8.20.0"),
        ];
        let base_key = compute_key(base.0, base.1, base.2, base.3);
        for (ns, platform, arch, version) in variants {
            assert_ne!(compute_key(ns, platform, arch, version), base_key);
        }
    }

    #[test]
    fn fallbacks_are_strict_prefixes_most_specific_first() {
        let identity = CacheIdentity::new("v1", "linux", "x86_64", "8.19.2");
        let key = identity.key();
        let prefixes = identity.fallback_prefixes();

        assert_eq!(
            prefixes,
            vec![
                "setup-rocq-v1-linux-x86_64-rocq-".to_string(),
                "setup-rocq-v1-linux-x86_64-".to_string(),
            ]
        );
        for prefix in &prefixes {
            assert!(key.starts_with(prefix.as_str()));
            assert!(prefix.len() < key.len());
        }
        assert!(prefixes.windows(2).all(|w| w[0].len() > w[1].len()));
    }

    #[test]
    fn unknown_platforms_are_accepted() {
        let identity = CacheIdentity::new("v1", "plan9", "mips", "latest");
        assert_eq!(identity.key(), "setup-rocq-v1-plan9-mips-rocq-latest");
    }

    #[test]
    fn host_identity_uses_version_segment() {
        let identity = CacheIdentity::for_host("v1", &RocqVersion::Dev);
        assert_eq!(identity.toolchain_version, "dev");
        assert_eq!(identity.platform, std::env::consts::OS);
        assert!(identity.key().ends_with("-rocq-dev"));
    }
}
