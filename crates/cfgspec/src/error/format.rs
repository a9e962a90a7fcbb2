//! Colored rendering of validation failures for terminals

use crate::error::ConfigValidationError;
use std::fmt;
use yansi::Paint;

/// Format a validation error with colors when stderr is a terminal
pub struct ErrorFormatter<'a> {
    error: &'a ConfigValidationError,
    use_colors: bool,
}

impl<'a> ErrorFormatter<'a> {
    /// Create a formatter that colors output if the terminal supports it
    pub fn new(error: &'a ConfigValidationError) -> Self {
        Self {
            error,
            use_colors: supports_color(),
        }
    }

    /// Create a formatter that never emits escape codes
    pub fn plain(error: &'a ConfigValidationError) -> Self {
        Self {
            error,
            use_colors: false,
        }
    }

    pub fn format(&self) -> String {
        if self.use_colors {
            self.format_colored()
        } else {
            self.format_plain()
        }
    }

    fn format_colored(&self) -> String {
        let count = self.error.errors().len();
        let count_str = format!("{} error(s)", count);
        let mut out = format!(
            "{} Config validation failed ({})",
            "✗".red().bold(),
            count_str.yellow()
        );
        for message in self.error.errors() {
            let (subject, detail) = split_message(message);
            match detail {
                Some(detail) => {
                    out.push_str(&format!("\n  {} {}: {}", "-".red(), subject.cyan(), detail))
                }
                None => out.push_str(&format!("\n  {} {}", "-".red(), subject)),
            }
        }
        out
    }

    fn format_plain(&self) -> String {
        self.error.to_string()
    }
}

/// Split `"Missing required env: KEY"` into its headline and the detail after the colon
fn split_message(message: &str) -> (&str, Option<&str>) {
    match message.split_once(": ") {
        Some((subject, detail)) => (subject, Some(detail)),
        None => (message, None),
    }
}

/// Check if terminal supports colors
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    atty::is(atty::Stream::Stderr)
}

impl fmt::Display for ErrorFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
