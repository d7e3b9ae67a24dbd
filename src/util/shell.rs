//! Terminal output and progress reporting.
//!
//! Commands print through a [`Shell`] so that `--quiet`, `--verbose` and
//! `--no-color` are honoured in one place. Status lines and the progress bar
//! go to stderr; command results (BUILD text, JSON, listings) go to stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: debug logging, one line per finished package instead of a bar
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Generated,
    Finished,

    // Warning statuses (yellow)
    Skipped,
    Stale,
    Warning,

    // Error (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Generated => "Generated",
            Status::Finished => "Finished",
            Status::Skipped => "Skipped",
            Status::Stale => "Stale",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Generated | Status::Finished => "\x1b[1;32m",
            Status::Skipped | Status::Stale | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Status labels are right-aligned to this width.
const STATUS_WIDTH: usize = 12;

/// Central shell for CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. `--quiet` wins over `--verbose`.
    pub fn from_flags(quiet: bool, verbose: bool, no_color: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        let color = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Shell::new(verbosity, color)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message: `{status:>12} {message}`.
    ///
    /// In quiet mode, only Error status is printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                status.as_str(),
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", status.as_str(), width = STATUS_WIDTH)
        }
    }

    /// Create a progress bar over `total` items.
    ///
    /// Quiet and verbose modes get no bar.
    pub fn progress(&self, total: u64, msg: impl Display) -> Progress {
        let message = msg.to_string();
        let pb = if self.is_quiet() || self.is_verbose() || total <= 1 {
            None
        } else {
            let pb = ProgressBar::new(total);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.set_message(message.clone());
            Some(pb)
        };

        Progress {
            pb,
            verbose: self.is_verbose(),
            total,
            current: AtomicU64::new(0),
            message,
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Progress bar that can be advanced from worker threads.
#[derive(Debug)]
pub struct Progress {
    pb: Option<ProgressBar>,
    verbose: bool,
    total: u64,
    current: AtomicU64,
    message: String,
}

impl Progress {
    /// Advance by one item.
    pub fn inc(&self, item: impl Display) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pb) = &self.pb {
            pb.inc(1);
        }
        if self.verbose {
            eprintln!("  {} {} [{}/{}]", self.message, item, current, self.total);
        }
    }

    pub fn position(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        let shell = Shell::from_flags(false, false, true);
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.use_color());

        assert!(Shell::from_flags(true, false, true).is_quiet());
        assert!(Shell::from_flags(false, true, true).is_verbose());
        // --quiet wins
        assert!(Shell::from_flags(true, true, true).is_quiet());
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);
        let formatted = shell.format_status(Status::Generated);
        assert_eq!(formatted.trim(), "Generated");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_progress_counts_without_a_bar() {
        let shell = Shell::new(Verbosity::Quiet, ColorChoice::Never);
        let progress = shell.progress(3, "Scanning");
        progress.inc("a");
        progress.inc("b");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
