//! Console output for provisioning runs
//!
//! Interactive terminals get colors and spinners. On GitHub Actions, groups
//! and annotations are emitted as workflow commands so the log folds per
//! step and failures surface on the run summary. Everything else gets
//! plain bracketed lines.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocq_setup::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let _group = ui::group(&ctx, "Restoring opam cache");
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Looking up cache entries...");
//! spinner.stop("Cache restored");
//!
//! ui::warning(&ctx, "Cache entry already exists");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    escape_data, failure, group, notice, outro_success, step_info, step_ok, warning,
    workflow_command, GroupGuard,
};
pub use progress::TaskSpinner;
