///! Confirmation prompts for destructive actions

use colored::Colorize;

pub trait Confirm: Send + Sync {
    /// Ask the user to confirm `action`. `detail` explains what will be lost.
    fn confirm(&self, action: &str, detail: &str) -> bool;
}

/// Interactive terminal prompt
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, action: &str, detail: &str) -> bool {
        println!("{} {}", "⚠".yellow().bold(), detail.yellow());

        dialoguer::Confirm::new()
            .with_prompt(action)
            .default(false)
            .interact()
            .unwrap_or_else(|err| {
                tracing::warn!("confirmation prompt failed: {}", err);
                false
            })
    }
}

/// Fixed answer, used for `--yes` and in tests
pub struct AssumeAnswer(pub bool);

impl Confirm for AssumeAnswer {
    fn confirm(&self, action: &str, _detail: &str) -> bool {
        tracing::debug!("auto-answering '{}' with {}", action, self.0);
        self.0
    }
}
