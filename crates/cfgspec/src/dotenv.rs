//! Loading `.env` style files into the process environment
//!
//! For mode `production` the candidates are, from most general to most specific:
//!
//! - `.env`
//! - `.env.local`
//! - `.env.production`
//! - `.env.production.local`
//!
//! Files are read most specific first and a variable that is already set is never
//! overwritten, so the most specific file wins and real process variables beat every file.

use crate::define::MODE_VAR;
use crate::error::EnvFileError;
use std::env;
use std::path::PathBuf;
use tracing::{debug, trace, warn};

/// Mode used when neither the options nor `APP_ENV` name one
pub const DEFAULT_MODE: &str = "development";

/// Where to look for env files and which mode-specific files to consider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFileOptions {
    /// Directory holding the files; the working directory when unset
    pub base_path: Option<PathBuf>,
    /// Mode for `.env.<mode>` files; `APP_ENV`, then `development`, when unset
    pub mode: Option<String>,
}

impl EnvFileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    fn resolve_mode(&self) -> String {
        self.mode
            .clone()
            .or_else(|| env::var(MODE_VAR).ok())
            .unwrap_or_else(|| DEFAULT_MODE.to_string())
    }
}

/// Outcome of one [`load_env_files`] call
#[derive(Debug, Default)]
pub struct EnvFileReport {
    /// Files that were merged, in the order they were read
    pub loaded: Vec<PathBuf>,
    /// Files that existed but could not be loaded
    pub skipped: Vec<EnvFileError>,
}

/// Candidate file names from most general to most specific
pub fn candidate_files(mode: &str) -> [String; 4] {
    [
        ".env".to_string(),
        ".env.local".to_string(),
        format!(".env.{}", mode),
        format!(".env.{}.local", mode),
    ]
}

/// Merge every existing candidate file into the process environment
///
/// Missing files are skipped silently, unreadable ones are logged and reported.
pub fn load_env_files(options: &EnvFileOptions) -> Result<EnvFileReport, EnvFileError> {
    let base_path = match &options.base_path {
        Some(path) => path.clone(),
        None => env::current_dir().map_err(|source| EnvFileError::CurrentDir { source })?,
    };
    let mode = options.resolve_mode();

    let mut report = EnvFileReport::default();
    for file in candidate_files(&mode).iter().rev() {
        let path = base_path.join(file);
        if !path.exists() {
            trace!(path = %path.display(), "env file not present");
            continue;
        }

        match dotenvy::from_path(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "loaded env file");
                report.loaded.push(path);
            }
            Err(source) => {
                warn!(path = %path.display(), "failed to load env file: {}", source);
                report.skipped.push(EnvFileError::Load { path, source });
            }
        }
    }

    Ok(report)
}
