//! OS package installation
//!
//! Installs a whole batch in one package manager call. Failures are not
//! retried and are reported against the batch, since the package managers
//! do not report partial success reliably.

use crate::error::{SetupError, SetupResult};
use crate::exec;
use async_trait::async_trait;
use tracing::info;

/// An OS package manager that installs batches
#[async_trait]
pub trait PackageManager: Send + Sync {
    async fn install_packages(&self, names: &[String]) -> SetupResult<()>;

    /// Best-effort tuning before the first install
    async fn prepare(&self) {}

    fn manager_name(&self) -> &'static str;
}

/// apt-get via sudo
#[derive(Debug, Clone, Copy, Default)]
pub struct Apt;

impl Apt {
    /// man-db rebuilds its index after every install, which is slow on
    /// runners. Failures here only cost time.
    async fn disable_man_db_auto_update() {
        if let Err(e) = exec::run_with_input(
            "sudo",
            &["debconf-communicate"],
            b"set man-db/auto-update false\n",
        )
        .await
        {
            info!("{}", e);
        }

        if let Err(e) = exec::run("sudo", &["dpkg-reconfigure", "man-db"]).await {
            info!("{}", e);
        }
    }
}

#[async_trait]
impl PackageManager for Apt {
    async fn install_packages(&self, names: &[String]) -> SetupResult<()> {
        let mut args = vec!["apt-get", "install", "-y"];
        args.extend(names.iter().map(String::as_str));
        exec::run("sudo", &args).await
    }

    async fn prepare(&self) {
        Self::disable_man_db_auto_update().await;
    }

    fn manager_name(&self) -> &'static str {
        "apt"
    }
}

/// Homebrew
#[derive(Debug, Clone, Copy, Default)]
pub struct Brew;

#[async_trait]
impl PackageManager for Brew {
    async fn install_packages(&self, names: &[String]) -> SetupResult<()> {
        let mut args = vec!["install"];
        args.extend(names.iter().map(String::as_str));
        exec::run("brew", &args).await
    }

    fn manager_name(&self) -> &'static str {
        "brew"
    }
}

/// Batch installer over a `PackageManager`
pub struct PackageInstaller<'a> {
    manager: &'a dyn PackageManager,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(manager: &'a dyn PackageManager) -> Self {
        Self { manager }
    }

    /// Install mandatory and probed optional packages as one batch.
    ///
    /// Optional names must already be filtered by a probe. An empty batch
    /// is a no-op.
    pub async fn install_batch(&self, names: &[String]) -> SetupResult<()> {
        if names.is_empty() {
            info!("No packages to install");
            return Ok(());
        }

        let joined = names.join(", ");
        info!("Installing packages: {}", joined);

        self.manager
            .install_packages(names)
            .await
            .map_err(|e| SetupError::PackageInstall {
                packages: joined,
                reason: e.to_string(),
            })
    }
}
