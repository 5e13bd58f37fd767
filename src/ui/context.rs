//! UI context for detecting interactive vs CI environments

use std::io::IsTerminal;

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether running in an interactive terminal
    interactive: bool,
    /// Whether running as a GitHub Actions step
    github_actions: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            github_actions: Self::detect_github_actions(),
        }
    }

    /// Plain output with no workflow commands (for tests and pipes)
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            github_actions: false,
        }
    }

    /// Plain output plus workflow commands
    pub fn github_actions() -> Self {
        Self {
            interactive: false,
            github_actions: true,
        }
    }

    /// Check if we're in an interactive terminal
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Whether output should carry workflow commands
    pub fn is_github_actions(&self) -> bool {
        self.github_actions
    }

    /// Check if we should use fancy output (spinners, colors)
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }

    fn detect_github_actions() -> bool {
        std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
    }

    /// Detect if running in an interactive environment
    fn detect_interactive() -> bool {
        if !std::io::stdout().is_terminal() {
            return false;
        }

        if std::env::var("CI").is_ok() {
            return false;
        }

        let ci_vars = [
            "GITHUB_ACTIONS",
            "GITLAB_CI",
            "CIRCLECI",
            "BUILDKITE",
            "TF_BUILD",
        ];

        !ci_vars.iter().any(|var| std::env::var(var).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.is_github_actions());
    }

    #[test]
    #[serial]
    fn detects_github_actions() {
        let saved = std::env::var_os("GITHUB_ACTIONS");

        std::env::set_var("GITHUB_ACTIONS", "true");
        let ctx = UiContext::detect();
        assert!(ctx.is_github_actions());
        assert!(!ctx.is_interactive());

        std::env::set_var("GITHUB_ACTIONS", "false");
        assert!(!UiContext::detect().is_github_actions());

        match saved {
            Some(v) => std::env::set_var("GITHUB_ACTIONS", v),
            None => std::env::remove_var("GITHUB_ACTIONS"),
        }
    }
}
