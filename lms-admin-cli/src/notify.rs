///! User notifications emitted by the panels

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

use crate::output;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Blocking "please wait" indicator, replaced by the next success or error
    Loading(String),
    Success(String),
    Error {
        message: String,
        detail: Option<String>,
    },
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            detail: None,
        }
    }

    pub fn error_with(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::Error {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Terminal notifier: status lines plus a spinner for `Loading`
#[derive(Default)]
pub struct ConsoleNotifier {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Loading(message) => {
                self.clear_spinner();

                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
                    bar.set_style(style);
                }
                bar.set_message(message);
                bar.enable_steady_tick(Duration::from_millis(100));

                if let Ok(mut slot) = self.spinner.lock() {
                    *slot = Some(bar);
                }
            }
            Notification::Success(message) => {
                self.clear_spinner();
                output::print_success(&message);
            }
            Notification::Error { message, detail } => {
                self.clear_spinner();
                match detail {
                    Some(detail) => output::print_error(&format!("{}: {}", message, detail)),
                    None => output::print_error(&message),
                }
            }
        }
    }
}
