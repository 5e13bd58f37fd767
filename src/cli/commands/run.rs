//! Run command - restore the cache and provision the toolchain

use super::host_toolchain;
use crate::cache::{cache_paths, create_store, CacheGateway, CacheIdentity};
use crate::cli::args::RunArgs;
use crate::config::Config;
use crate::error::SetupResult;
use crate::orchestrator::Orchestrator;
use crate::packages::SystemPackages;
use crate::platform::Platform;
use crate::state::RunState;
use crate::ui::{self, UiContext};
use crate::version::RocqVersion;
use std::path::Path;
use tracing::{debug, warn};

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config, state_file: &Path) -> SetupResult<()> {
    let ctx = UiContext::detect();

    let rocq = args
        .rocq_version
        .as_deref()
        .map(str::parse::<RocqVersion>)
        .transpose()?;

    let platform = Platform::detect();
    let identity = CacheIdentity::for_host(
        &config.cache.namespace_version,
        &rocq.clone().unwrap_or_default(),
    );

    let gateway = CacheGateway::new(
        create_store(config, args.no_cache),
        cache_paths(config, &platform),
    );
    debug!("Using cache store: {}", gateway.store_name());

    let toolchain = host_toolchain(config, &platform);
    let system = SystemPackages::for_platform(&platform, &config.packages);

    let mut state = RunState::new();
    let run = Orchestrator::new(&gateway, &toolchain, identity, &ctx)
        .with_system_packages(&system)
        .with_rocq(rocq)
        .run(&mut state)
        .await;

    // The post stage needs the key even when provisioning failed
    if let Err(e) = state.save(state_file).await {
        warn!("Failed to record run state: {}", e);
    }

    if run.is_success() {
        ui::outro_success(&ctx, "Rocq development environment ready");
    }
    run.into_result()
}
