//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// rocq-setup - cached opam toolchain for Rocq projects
///
/// Provisions opam, an OCaml switch and optionally Rocq on a CI runner,
/// restoring and saving the installed state through a cache.
#[derive(Parser, Debug)]
#[command(name = "rocq-setup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ROCQ_SETUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run state file shared between `run` and `save`
    #[arg(long, global = true, env = "ROCQ_SETUP_STATE")]
    pub state_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore the cache and provision the toolchain
    Run(RunArgs),

    /// Clean opam and save the toolchain to the cache
    Save(SaveArgs),

    /// Print the cache key for this host
    Key(KeyArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Rocq to install: "dev", "latest" or a version such as 8.20.0
    #[arg(long, env = "INPUT_ROCQ-VERSION")]
    pub rocq_version: Option<String>,

    /// Skip cache restore
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the save command
#[derive(Parser, Debug)]
pub struct SaveArgs {
    /// Skip the cache save (cleanup still runs)
    #[arg(long)]
    pub no_cache: bool,

    /// Skip `opam clean` before saving
    #[arg(long)]
    pub no_clean: bool,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Rocq version the key is computed for
    #[arg(long, env = "INPUT_ROCQ-VERSION")]
    pub rocq_version: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Output format for the key command
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Primary key, then one fallback prefix per line
    #[default]
    Plain,
    /// JSON object
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
