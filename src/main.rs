//! rocq-setup - cached opam toolchain for Rocq projects
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use rocq_setup::cli::{Cli, Commands};
use rocq_setup::config::{Config, ConfigManager};
use rocq_setup::error::SetupResult;
use rocq_setup::ui::{self, UiContext};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let ctx = UiContext::detect();
            if ctx.is_github_actions() {
                ui::failure(&ctx, &e.to_string());
            }
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SetupResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config: {}", config_manager.path().display());

    let state_file = cli.state_file.unwrap_or_else(ConfigManager::state_file);
    debug!("Using run state: {}", state_file.display());

    match cli.command {
        Commands::Run(args) => rocq_setup::cli::commands::run(args, &config, &state_file).await,
        Commands::Save(args) => rocq_setup::cli::commands::save(args, &config, &state_file).await,
        Commands::Key(args) => rocq_setup::cli::commands::key(args, &config).await,
        Commands::Config(args) => {
            rocq_setup::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = info, 1 = debug, 2+ = trace. `RUST_LOG` wins when set.
fn init_logging(verbose: u8, config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("rocq_setup=info"),
        1 => EnvFilter::new("rocq_setup=debug"),
        _ => EnvFilter::new("rocq_setup=trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
