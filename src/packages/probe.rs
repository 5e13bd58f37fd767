//! Package index queries
//!
//! A probe answers "can this optional package be installed here?". Any
//! failure to answer is a no, so optional packages never block provisioning.

use crate::error::SetupResult;
use crate::exec;
use async_trait::async_trait;
use tracing::{debug, info};

/// Read-only view of the OS package index
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Succeeds when the index knows `name`; errors otherwise
    async fn probe_available(&self, name: &str) -> SetupResult<()>;
}

/// Debian/Ubuntu index via `apt-cache show`
#[derive(Debug, Clone, Copy, Default)]
pub struct AptIndex;

#[async_trait]
impl PackageIndex for AptIndex {
    async fn probe_available(&self, name: &str) -> SetupResult<()> {
        exec::run_silent("apt-cache", &["show", name]).await
    }
}

/// Fail-closed wrapper around a `PackageIndex`
pub struct PackageAvailabilityProbe<'a> {
    index: &'a dyn PackageIndex,
}

impl<'a> PackageAvailabilityProbe<'a> {
    pub fn new(index: &'a dyn PackageIndex) -> Self {
        Self { index }
    }

    /// Whether `name` can be installed. Never errors.
    pub async fn is_installable(&self, name: &str) -> bool {
        match self.index.probe_available(name).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Package {} not installable: {}", name, e);
                false
            }
        }
    }

    /// Installable subset of `candidates`, in candidate order.
    ///
    /// Each candidate is probed on its own.
    pub async fn resolve(&self, candidates: &[String]) -> Vec<String> {
        let mut installable = Vec::with_capacity(candidates.len());
        for name in candidates {
            if self.is_installable(name).await {
                installable.push(name.clone());
            } else {
                info!("Optional package {} is not available, skipping", name);
            }
        }
        installable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;

    struct FakeIndex {
        known: Vec<&'static str>,
    }

    #[async_trait]
    impl PackageIndex for FakeIndex {
        async fn probe_available(&self, name: &str) -> SetupResult<()> {
            if self.known.contains(&name) {
                Ok(())
            } else if name == "network-down" {
                Err(SetupError::command_failed(
                    "apt-cache show network-down",
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"),
                ))
            } else {
                Err(SetupError::command_exit(
                    format!("apt-cache show {}", name),
                    100,
                    "",
                ))
            }
        }
    }

    #[tokio::test]
    async fn errors_become_false() {
        let index = FakeIndex { known: vec!["darcs"] };
        let probe = PackageAvailabilityProbe::new(&index);

        assert!(probe.is_installable("darcs").await);
        assert!(!probe.is_installable("gcc-multilib").await);
        assert!(!probe.is_installable("network-down").await);
    }

    #[tokio::test]
    async fn resolve_keeps_order_and_filters() {
        let index = FakeIndex {
            known: vec!["mercurial", "darcs"],
        };
        let probe = PackageAvailabilityProbe::new(&index);
        let candidates: Vec<String> = ["darcs", "g++-multilib", "network-down", "mercurial"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let resolved = probe.resolve(&candidates).await;
        assert_eq!(resolved, vec!["darcs".to_string(), "mercurial".to_string()]);
    }

    #[tokio::test]
    async fn resolve_empty() {
        let index = FakeIndex { known: vec![] };
        let probe = PackageAvailabilityProbe::new(&index);
        assert!(probe.resolve(&[]).await.is_empty());
    }
}
