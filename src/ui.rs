//! User-facing output channel.
//!
//! The host owns the terminal; the post-processor only reports progress
//! through this trait.

use log::{error, info};

pub trait Ui: Send + Sync {
    /// Headline for a new step.
    fn say(&self, message: &str);

    /// Detail line inside the current step.
    fn message(&self, message: &str);

    fn error(&self, message: &str);
}

/// Prints to the terminal with a component prefix and mirrors to the log.
pub struct ConsoleUi {
    prefix: String,
}

impl ConsoleUi {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn format_say(&self, message: &str) -> String {
        format!("==> {}: {}", self.prefix, message)
    }

    pub fn format_message(&self, message: &str) -> String {
        format!("    {}: {}", self.prefix, message)
    }
}

impl Ui for ConsoleUi {
    fn say(&self, message: &str) {
        info!("{}", message);
        println!("{}", self.format_say(message));
    }

    fn message(&self, message: &str) {
        info!("{}", message);
        println!("{}", self.format_message(message));
    }

    fn error(&self, message: &str) {
        error!("{}", message);
        eprintln!("{}", self.format_say(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        let ui = ConsoleUi::new("kvsnap");
        assert_eq!(ui.format_say("Recording"), "==> kvsnap: Recording");
        assert_eq!(ui.format_message("detail"), "    kvsnap: detail");
    }
}
