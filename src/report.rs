//! User-facing status lines.
//!
//! Callers grep these lines, so every message starts with a fixed severity
//! prefix (`ERROR` or `Warning`). Lines are printed whatever the log level
//! and are mirrored to the `log` facade.

use colored::Colorize;
use log::{info, warn};

/// Collects and prints warnings and progress messages for one run.
#[derive(Debug, Default)]
pub struct Reporter {
    quiet: bool,
    warnings: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    /// A reporter that records but never prints. Used by tests.
    pub fn quiet() -> Self {
        Reporter {
            quiet: true,
            warnings: Vec::new(),
        }
    }

    /// Print a warning. `message` must already carry its `Warning` prefix.
    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        if !self.quiet {
            eprintln!("{}", message.as_str().yellow());
        }
        self.warnings.push(message);
    }

    /// Print a progress line on stdout.
    pub fn progress(&self, message: &str) {
        info!("{}", message);
        if !self.quiet {
            println!("{}", message);
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Render a fatal error line, including its chain of causes.
pub fn format_error(err: &anyhow::Error) -> String {
    format!("ERROR: {:#}", err)
}
