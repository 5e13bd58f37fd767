//! opam toolchain steps
//!
//! Each provisioning step is independently invokable so the orchestrator can
//! skip the expensive ones after a cache hit.

mod env;
mod opam;
pub mod rocq;

pub use env::parse_sh_env;
pub use opam::Opam;

use crate::error::SetupResult;
use async_trait::async_trait;

/// Where a pinned package's sources come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinSource {
    /// A git URL, e.g. `git+https://github.com/rocq-prover/rocq.git`
    Git(String),
    /// The package's own `dev-repo` field
    DevRepo,
}

/// Steps and primitives of the package-manager toolchain
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Fetch the package manager
    async fn acquire(&self) -> SetupResult<()>;

    /// Initialize the package manager root
    async fn initialize(&self) -> SetupResult<()>;

    /// Create the compiler switch
    async fn create_switch(&self) -> SetupResult<()>;

    /// Export the switch environment for this process and later steps
    async fn export_env(&self) -> SetupResult<()>;

    /// Turn off the build tool's own artifact cache
    async fn disable_secondary_cache(&self) -> SetupResult<()>;

    async fn pin(&self, package: &str, source: &PinSource) -> SetupResult<()>;

    async fn install(&self, package: &str, flags: &[&str]) -> SetupResult<()>;

    /// Shrink the package manager state before it is cached
    async fn clean(&self) -> SetupResult<()>;
}
