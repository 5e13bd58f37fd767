//! Save command - clean opam and save the toolchain to the cache
//!
//! Runs as the post stage of a job. Nothing here fails the job: cache
//! problems are reported as warnings.

use super::host_toolchain;
use crate::cache::{cache_paths, create_store, CacheGateway, SaveOutcome};
use crate::cli::args::SaveArgs;
use crate::config::Config;
use crate::error::{SetupError, SetupResult};
use crate::platform::Platform;
use crate::state::RunState;
use crate::toolchain::Toolchain;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the save command
pub async fn execute(args: SaveArgs, config: &Config, state_file: &Path) -> SetupResult<()> {
    let ctx = UiContext::detect();

    if !state_file.exists() {
        ui::warning(
            &ctx,
            &format!(
                "{}, skipping save",
                SetupError::MissingRunState(state_file.to_path_buf())
            ),
        );
        return Ok(());
    }

    let state = RunState::load(state_file).await?;
    let Some(key) = state.cache_key() else {
        ui::warning(&ctx, "No cache key found, skipping save");
        return Ok(());
    };

    let platform = Platform::detect();

    if !args.no_clean {
        let _group = ui::group(&ctx, "Cleaning opam");
        if let Err(e) = host_toolchain(config, &platform).clean().await {
            ui::warning(&ctx, &format!("opam clean failed: {}", e));
        }
    }

    let gateway = CacheGateway::new(
        create_store(config, args.no_cache),
        cache_paths(config, &platform),
    );

    let _group = ui::group(&ctx, "Saving opam cache");
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Saving {} to {} store", key, gateway.store_name()));

    match gateway.save(key).await {
        Ok(SaveOutcome::Saved) => spinner.stop("Cache saved"),
        Ok(SaveOutcome::AlreadyExists) => spinner.stop("Cache already exists"),
        Err(e) => {
            spinner.stop_warn("Cache not saved");
            ui::warning(&ctx, &format!("Failed to save cache: {}", e));
        }
    }

    Ok(())
}
