//! CLI command implementations

pub mod config;
pub mod key;
pub mod run;
pub mod save;

pub use config::execute as config;
pub use key::execute as key;
pub use run::execute as run;
pub use save::execute as save;

use crate::config::Config;
use crate::platform::{Architecture, Platform};
use crate::runner::RunnerEnv;
use crate::toolchain::Opam;

/// opam toolchain for this host
fn host_toolchain(config: &Config, platform: &Platform) -> Opam {
    Opam::new(
        config.toolchain.clone(),
        platform.clone(),
        Architecture::detect(),
        RunnerEnv::detect(),
    )
}
