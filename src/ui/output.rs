//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::style;

/// Escape a workflow command message.
///
/// The runner reads one command per line, so line breaks and the escape
/// character itself are percent-encoded.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format `::name::message`
pub fn workflow_command(name: &str, message: &str) -> String {
    format!("::{}::{}", name, escape_data(message))
}

/// Closes a log group when dropped
#[must_use = "the group closes when the guard is dropped"]
pub struct GroupGuard {
    github_actions: bool,
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if self.github_actions {
            println!("::endgroup::");
        }
    }
}

/// Open a collapsible log group, or print a section header
pub fn group(ctx: &UiContext, title: &str) -> GroupGuard {
    if ctx.is_github_actions() {
        println!("{}", workflow_command("group", title));
    } else {
        println!();
        println!("{}", style(title).bold());
    }
    GroupGuard {
        github_actions: ctx.is_github_actions(),
    }
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("✓").green(), message);
    } else {
        println!("  [OK] {}", message);
    }
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("•").cyan(), message);
    } else {
        println!("  [INFO] {}", message);
    }
}

/// Informational annotation
pub fn notice(ctx: &UiContext, message: &str) {
    if ctx.is_github_actions() {
        println!("{}", workflow_command("notice", message));
    } else {
        step_info(ctx, message);
    }
}

/// Warning annotation
pub fn warning(ctx: &UiContext, message: &str) {
    if ctx.is_github_actions() {
        println!("{}", workflow_command("warning", message));
    } else if ctx.use_fancy_output() {
        println!("  {} {}", style("!").yellow(), message);
    } else {
        println!("  [WARN] {}", message);
    }
}

/// Error annotation; the run is reported failed by the exit code
pub fn failure(ctx: &UiContext, message: &str) {
    if ctx.is_github_actions() {
        println!("{}", workflow_command("error", message));
    } else if ctx.use_fancy_output() {
        eprintln!("  {} {}", style("✗").red(), message);
    } else {
        eprintln!("  [FAIL] {}", message);
    }
}

/// Display success outro
pub fn outro_success(ctx: &UiContext, message: &str) {
    println!();
    if ctx.use_fancy_output() {
        println!("{}", style(message).green().bold());
    } else {
        println!("[OK] {}", message);
    }
}
