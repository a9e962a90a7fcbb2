//! Error types for configuration resolution and env file loading

pub mod format;

use std::path::PathBuf;
use thiserror::Error;

pub use format::ErrorFormatter;

/// Result type for config resolution
pub type Result<T> = std::result::Result<T, ConfigValidationError>;

/// Every failure collected during one resolution pass
///
/// This is the only error a [`ConfigAccessor`](crate::ConfigAccessor) returns. It always
/// carries at least one message, in the order the failing entries were declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Config validation failed:\n  - {}", .errors.join("\n  - "))]
pub struct ConfigValidationError {
    errors: Vec<String>,
}

impl ConfigValidationError {
    /// Build the aggregate error, or `None` when nothing failed
    pub fn from_messages(errors: Vec<String>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub(crate) fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    /// Individual failure messages in collection order
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// Errors raised while reading `.env` style files
#[derive(Debug, Error)]
pub enum EnvFileError {
    /// No base path was given and the working directory is unavailable
    #[error("Failed to determine base path for env files\n{source}")]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },

    /// An existing env file could not be read or parsed
    #[error("Failed to load env file: {path}\n{source}")]
    Load {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}
