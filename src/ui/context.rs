//! UI context for detecting interactive vs batch environments

use std::io::IsTerminal;

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether running in an interactive terminal
    interactive: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
        }
    }

    /// Create a non-interactive context (for testing or batch jobs)
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    /// Check if we should use fancy output (spinners, colors)
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }

    fn detect_interactive() -> bool {
        if !std::io::stdout().is_terminal() || !std::io::stderr().is_terminal() {
            return false;
        }

        // Batch jobs and CI runners
        let batch_vars = ["CI", "SLURM_JOB_ID", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_URL"];
        !batch_vars.iter().any(|var| std::env::var_os(var).is_some())
    }
}
