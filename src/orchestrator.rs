//! Provisioning state machine
//!
//! ```text
//! Start -> CacheChecked -> ToolchainAcquired -> EnvironmentReady -> Done
//!   \___________\_______________\___________________\______-> Failed
//! ```
//!
//! A cache hit skips acquiring opam, initializing its root and creating the
//! switch. System packages, environment export and the secondary-cache
//! disable always run: a restore brings back files under the cached paths,
//! not OS packages or environment variables.

use crate::cache::{CacheGateway, CacheIdentity, CacheOutcome};
use crate::error::{SetupError, SetupResult};
use crate::packages::SystemPackages;
use crate::state::RunState;
use crate::toolchain::{rocq, Toolchain};
use crate::ui::{self, UiContext};
use crate::version::RocqVersion;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info};

/// Reported when a step fails without a usable error
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Step cursor of a run. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    CacheChecked,
    ToolchainAcquired,
    EnvironmentReady,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Lifecycle record of one provisioning run
#[derive(Debug)]
pub struct ProvisioningRun {
    stage: Stage,
    outcome: Option<CacheOutcome>,
    error: Option<SetupError>,
}

impl Default for ProvisioningRun {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisioningRun {
    pub fn new() -> Self {
        Self {
            stage: Stage::Start,
            outcome: None,
            error: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn outcome(&self) -> Option<&CacheOutcome> {
        self.outcome.as_ref()
    }

    /// The error that stopped the run, once `Failed`
    pub fn error(&self) -> Option<&SetupError> {
        self.error.as_ref()
    }

    /// The single failure message, once `Failed`
    pub fn failure(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage && !self.stage.is_terminal());
        debug!("Stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, error: SetupError) {
        if self.stage.is_terminal() {
            return;
        }
        error!("Provisioning failed at {:?}: {}", self.stage, error);
        self.stage = Stage::Failed;
        self.error = Some(error);
    }

    /// Convert into a result carrying the error that stopped the run
    pub fn into_result(self) -> SetupResult<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Sequences cache restore and toolchain steps for one run
pub struct Orchestrator<'a> {
    cache: &'a CacheGateway,
    toolchain: &'a dyn Toolchain,
    system: Option<&'a SystemPackages>,
    identity: CacheIdentity,
    rocq: Option<RocqVersion>,
    ui: &'a UiContext,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        cache: &'a CacheGateway,
        toolchain: &'a dyn Toolchain,
        identity: CacheIdentity,
        ui: &'a UiContext,
    ) -> Self {
        Self {
            cache,
            toolchain,
            system: None,
            identity,
            rocq: None,
            ui,
        }
    }

    /// Install OS packages after the cache check, hit or miss
    pub fn with_system_packages(mut self, system: &'a SystemPackages) -> Self {
        self.system = Some(system);
        self
    }

    /// Also install Rocq once the environment is ready
    pub fn with_rocq(mut self, version: Option<RocqVersion>) -> Self {
        self.rocq = version;
        self
    }

    /// Drive a run to `Done` or `Failed`.
    ///
    /// This is the only place step errors are caught. Panics are caught
    /// here too and reported with a fixed message.
    pub async fn run(&self, state: &mut RunState) -> ProvisioningRun {
        let mut run = ProvisioningRun::new();
        info!("Setting up Rocq development environment");

        let result = AssertUnwindSafe(self.drive(&mut run, state))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => {
                run.advance(Stage::Done);
                info!("Rocq development environment set up successfully");
            }
            Ok(Err(e)) => run.fail(e),
            Err(_) => run.fail(SetupError::User(UNKNOWN_ERROR_MESSAGE.to_string())),
        }
        run
    }

    async fn drive(&self, run: &mut ProvisioningRun, state: &mut RunState) -> SetupResult<()> {
        let outcome = {
            let _group = ui::group(self.ui, "Restoring opam cache");
            self.cache.restore(&self.identity, state).await
        };
        let restored = outcome.restored;
        run.outcome = Some(outcome);
        run.advance(Stage::CacheChecked);

        if let Some(system) = self.system {
            let _group = ui::group(self.ui, "Installing system packages");
            system.install().await?;
        }

        if restored {
            ui::notice(self.ui, "Skipping OCaml installation (restored from cache)");
        } else {
            {
                let _group = ui::group(self.ui, "Installing opam");
                self.toolchain.acquire().await?;
            }
            {
                let _group = ui::group(self.ui, "Initializing opam");
                self.toolchain.initialize().await?;
            }
            {
                let _group = ui::group(self.ui, "Creating opam switch");
                self.toolchain.create_switch().await?;
            }
        }
        run.advance(Stage::ToolchainAcquired);

        {
            let _group = ui::group(self.ui, "Setting up opam environment");
            self.toolchain.export_env().await?;
        }
        run.advance(Stage::EnvironmentReady);

        self.toolchain.disable_secondary_cache().await?;

        if let Some(ref version) = self.rocq {
            let _group = ui::group(self.ui, "Installing Rocq");
            rocq::install_rocq(self.toolchain, version).await?;
        }
        Ok(())
    }
}
