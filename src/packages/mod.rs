//! OS-level packages needed to build opam packages
//!
//! Mandatory packages always install; optional ones install only when the
//! package index confirms they exist on this runner image.

pub mod installer;
pub mod probe;

pub use installer::{Apt, Brew, PackageInstaller, PackageManager};
pub use probe::{AptIndex, PackageAvailabilityProbe, PackageIndex};

use crate::config::schema::PackagesConfig;
use crate::error::SetupResult;
use crate::platform::Platform;
use tracing::info;

/// Mandatory and optional packages for one install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    mandatory: Vec<String>,
    optional_candidates: Vec<String>,
    resolved_optional: Vec<String>,
}

fn dedup(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

impl PackageSet {
    pub fn new(mandatory: Vec<String>, optional_candidates: Vec<String>) -> Self {
        Self {
            mandatory: dedup(mandatory),
            optional_candidates: dedup(optional_candidates),
            resolved_optional: vec![],
        }
    }

    pub fn mandatory(&self) -> &[String] {
        &self.mandatory
    }

    pub fn optional_candidates(&self) -> &[String] {
        &self.optional_candidates
    }

    pub fn resolved_optional(&self) -> &[String] {
        &self.resolved_optional
    }

    /// Probe the optional candidates. Mandatory packages are untouched.
    pub async fn resolve(&mut self, probe: &PackageAvailabilityProbe<'_>) {
        self.resolved_optional = probe.resolve(&self.optional_candidates).await;
    }

    /// `mandatory ∪ resolved_optional`, mandatory first
    pub fn install_set(&self) -> Vec<String> {
        dedup(
            self.mandatory
                .iter()
                .chain(self.resolved_optional.iter())
                .cloned(),
        )
    }
}

/// System package step for the host platform
pub struct SystemPackages {
    set: PackageSet,
    index: Option<Box<dyn PackageIndex>>,
    manager: Option<Box<dyn PackageManager>>,
}

impl SystemPackages {
    pub fn new(
        set: PackageSet,
        index: Option<Box<dyn PackageIndex>>,
        manager: Option<Box<dyn PackageManager>>,
    ) -> Self {
        Self {
            set,
            index,
            manager,
        }
    }

    /// apt with probing on Linux, brew on macOS, nothing elsewhere
    pub fn for_platform(platform: &Platform, config: &PackagesConfig) -> Self {
        match platform {
            Platform::Linux => Self::new(
                PackageSet::new(config.linux_mandatory.clone(), config.linux_optional.clone()),
                Some(Box::new(AptIndex)),
                Some(Box::new(Apt)),
            ),
            Platform::MacOS => Self::new(
                PackageSet::new(config.macos.clone(), vec![]),
                None,
                Some(Box::new(Brew)),
            ),
            Platform::Other(_) => Self::new(PackageSet::default(), None, None),
        }
    }

    /// Resolve optional packages and install everything in one batch.
    ///
    /// Returns the set that was installed.
    pub async fn install(&self) -> SetupResult<PackageSet> {
        let mut set = self.set.clone();
        let Some(manager) = self.manager.as_deref() else {
            info!("No system package manager for this platform, skipping");
            return Ok(set);
        };

        manager.prepare().await;

        if let Some(index) = self.index.as_deref() {
            let probe = PackageAvailabilityProbe::new(index);
            set.resolve(&probe).await;
        }

        PackageInstaller::new(manager)
            .install_batch(&set.install_set())
            .await?;

        info!("System packages installed with {}", manager.manager_name());
        Ok(set)
    }

    pub fn package_set(&self) -> &PackageSet {
        &self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    struct ListIndex(Vec<String>);

    #[async_trait]
    impl PackageIndex for ListIndex {
        async fn probe_available(&self, name: &str) -> SetupResult<()> {
            if self.0.iter().any(|n| n == name) {
                Ok(())
            } else {
                Err(SetupError::command_exit("apt-cache show", 100, ""))
            }
        }
    }

    struct SharedManager(Arc<Mutex<Vec<Vec<String>>>>);

    #[async_trait]
    impl PackageManager for SharedManager {
        async fn install_packages(&self, names: &[String]) -> SetupResult<()> {
            self.0.lock().unwrap().push(names.to_vec());
            Ok(())
        }

        fn manager_name(&self) -> &'static str {
            "shared"
        }
    }

    #[tokio::test]
    async fn resolved_is_subset_of_candidates() {
        let index = ListIndex(names(&["darcs", "not-a-candidate"]));
        let probe = PackageAvailabilityProbe::new(&index);
        let mut set = PackageSet::new(names(&["rsync"]), names(&["darcs", "mercurial"]));

        set.resolve(&probe).await;

        assert_eq!(set.resolved_optional(), names(&["darcs"]).as_slice());
        assert!(set
            .resolved_optional()
            .iter()
            .all(|p| set.optional_candidates().contains(p)));
        assert_eq!(set.mandatory(), names(&["rsync"]).as_slice());
    }

    #[tokio::test]
    async fn failed_probes_keep_mandatory() {
        let index = ListIndex(vec![]);
        let probe = PackageAvailabilityProbe::new(&index);
        let mut set = PackageSet::new(names(&["libgmp-dev", "rsync"]), names(&["darcs"]));

        set.resolve(&probe).await;

        assert_eq!(set.install_set(), names(&["libgmp-dev", "rsync"]));
    }

    #[test]
    fn install_set_deduplicates() {
        let mut set = PackageSet::new(names(&["rsync", "rsync"]), names(&["rsync", "darcs"]));
        set.resolved_optional = names(&["rsync", "darcs"]);
        assert_eq!(set.install_set(), names(&["rsync", "darcs"]));
    }

    #[tokio::test]
    async fn system_install_runs_one_batch() {
        let batches = Arc::new(Mutex::new(vec![]));
        let system = SystemPackages::new(
            PackageSet::new(names(&["bubblewrap"]), names(&["darcs", "gcc-multilib"])),
            Some(Box::new(ListIndex(names(&["gcc-multilib"])))),
            Some(Box::new(SharedManager(Arc::clone(&batches)))),
        );

        let installed = system.install().await.unwrap();

        assert_eq!(installed.resolved_optional(), names(&["gcc-multilib"]).as_slice());

        assert_eq!(
            *batches.lock().unwrap(),
            vec![names(&["bubblewrap", "gcc-multilib"])]
        );
    }

    #[tokio::test]
    async fn no_manager_is_a_noop() {
        let system = SystemPackages::for_platform(
            &Platform::Other("freebsd".to_string()),
            &PackagesConfig::default(),
        );
        let installed = system.install().await.unwrap();
        assert!(installed.install_set().is_empty());
    }

    #[test]
    fn platform_package_lists() {
        let config = PackagesConfig::default();

        let linux = SystemPackages::for_platform(&Platform::Linux, &config);
        assert_eq!(linux.package_set().mandatory().len(), 5);
        assert_eq!(linux.package_set().optional_candidates().len(), 4);

        let macos = SystemPackages::for_platform(&Platform::MacOS, &config);
        assert_eq!(macos.package_set().mandatory(), names(&["darcs", "mercurial"]).as_slice());
        assert!(macos.package_set().optional_candidates().is_empty());
    }
}
