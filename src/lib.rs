//! rocq-setup - cached opam toolchain provisioning for Rocq projects
//!
//! Restores a previously installed opam root from a cache, installs opam and
//! an OCaml switch when nothing was restored, exports the switch environment
//! and optionally installs Rocq. A later stage cleans and saves the result.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod orchestrator;
pub mod packages;
pub mod platform;
pub mod runner;
pub mod state;
pub mod toolchain;
pub mod ui;
pub mod version;

pub use error::{SetupError, SetupResult};
