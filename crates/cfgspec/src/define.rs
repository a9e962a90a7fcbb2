//! The resolution engine
//!
//! [`define_config`] wraps a schema in a [`ConfigAccessor`]. Nothing is resolved until the
//! first [`ConfigAccessor::get`]; after a successful resolution the result is cached and
//! handed out again according to the accessor's [`CachePolicy`].

use crate::dotenv::{load_env_files, EnvFileOptions};
use crate::error::{ConfigValidationError, Result};
use crate::schema::Schema;
use crate::spec::ErrorSink;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Environment variable naming the current runtime mode
pub const MODE_VAR: &str = "APP_ENV";

/// Runtime mode in which [`CachePolicy::FromEnvironment`] never serves cached values
pub const TEST_MODE: &str = "test";

/// Whether `APP_ENV` currently selects test mode
pub fn is_test_mode() -> bool {
    std::env::var(MODE_VAR).is_ok_and(|mode| mode == TEST_MODE)
}

/// When an accessor may hand out a previously resolved configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Resolve once, then always return the cached value
    Always,
    /// Resolve on every access
    Never,
    /// Cache, except while `APP_ENV=test`
    #[default]
    FromEnvironment,
}

impl CachePolicy {
    /// Whether a cached value may be returned right now
    pub fn allows_cached(self) -> bool {
        match self {
            CachePolicy::Always => true,
            CachePolicy::Never => false,
            CachePolicy::FromEnvironment => !is_test_mode(),
        }
    }
}

type EnvLoader = Box<dyn Fn() + Send + Sync>;

/// Options for [`define_config`]
#[derive(Default)]
pub struct ConfigOptions {
    /// Populate the process environment before resolving
    pub load_env: bool,
    /// Loader to run instead of [`load_env_files`] when `load_env` is set
    pub env_loader: Option<EnvLoader>,
    /// Cache behavior for repeated access
    pub cache: CachePolicy,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` files (or run the custom loader) before each resolution
    pub fn with_load_env(mut self, load_env: bool) -> Self {
        self.load_env = load_env;
        self
    }

    /// Replace the default env file loader
    ///
    /// The loader only runs when `load_env` is also set.
    pub fn with_env_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.env_loader = Some(Box::new(loader));
        self
    }

    pub fn with_cache_policy(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("load_env", &self.load_env)
            .field("env_loader", &self.env_loader.as_ref().map(|_| "<fn>"))
            .field("cache", &self.cache)
            .finish()
    }
}

/// Lazily resolving handle to a configuration
///
/// The cache slot belongs to this accessor, not to the process. Two threads calling
/// [`get`](Self::get) for the very first time may both resolve; the later store wins.
pub struct ConfigAccessor<S: Schema> {
    schema: S,
    options: ConfigOptions,
    instance: Mutex<Option<Arc<S::Resolved>>>,
}

/// Wrap `schema` in an accessor; nothing is resolved yet
///
/// ```
/// use cfgspec::{computed_value, define_config, define_schema, CachePolicy, ConfigOptions};
///
/// define_schema! {
///     pub struct Paths {
///         pub root: String = computed_value(|| "/srv/app".to_string()),
///     }
/// }
///
/// let config = define_config(
///     Paths::schema(),
///     ConfigOptions::new().with_cache_policy(CachePolicy::Always),
/// );
/// assert_eq!(config.get().unwrap().root, "/srv/app");
/// ```
pub fn define_config<S: Schema>(schema: S, options: ConfigOptions) -> ConfigAccessor<S> {
    ConfigAccessor {
        schema,
        options,
        instance: Mutex::new(None),
    }
}

impl<S: Schema> ConfigAccessor<S> {
    /// Return the configuration, resolving it if needed
    ///
    /// Fails with every collected message when any entry could not be resolved. A failed
    /// resolution never replaces a previously cached value.
    pub fn get(&self) -> Result<Arc<S::Resolved>> {
        if let Some(cached) = self.cached() {
            if self.options.cache.allows_cached() {
                trace!("returning cached configuration");
                return Ok(cached);
            }
        }

        self.load_env();

        let mut errors = ErrorSink::new();
        let resolved = match (self.schema.resolve(&mut errors), errors.into_error()) {
            (Some(resolved), None) => resolved,
            (_, Some(error)) => {
                debug!(
                    failures = error.errors().len(),
                    "configuration failed validation"
                );
                return Err(error);
            }
            (None, None) => {
                return Err(ConfigValidationError::single(
                    "Schema produced no configuration",
                ))
            }
        };

        let resolved = Arc::new(resolved);
        *self.slot() = Some(Arc::clone(&resolved));
        debug!("configuration resolved");
        Ok(resolved)
    }

    /// Drop the cached configuration so the next access resolves again
    pub fn invalidate(&self) {
        *self.slot() = None;
    }

    pub fn is_cached(&self) -> bool {
        self.slot().is_some()
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    fn cached(&self) -> Option<Arc<S::Resolved>> {
        self.slot().as_ref().map(Arc::clone)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<S::Resolved>>> {
        self.instance.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_env(&self) {
        if !self.options.load_env {
            return;
        }

        match &self.options.env_loader {
            Some(loader) => loader(),
            None => match load_env_files(&EnvFileOptions::default()) {
                Ok(report) => trace!(loaded = report.loaded.len(), "env files loaded"),
                Err(e) => warn!("skipping env files: {}", e),
            },
        }
    }
}

impl<S: Schema + fmt::Debug> fmt::Debug for ConfigAccessor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigAccessor")
            .field("schema", &self.schema)
            .field("options", &self.options)
            .field("cached", &self.is_cached())
            .finish()
    }
}
