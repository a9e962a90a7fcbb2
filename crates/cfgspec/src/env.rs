//! Specs that read the process environment
//!
//! ```
//! use cfgspec::{env, env_boolean, env_number_optional};
//!
//! let api_key = env("API_KEY");                       // required string
//! let port = env_number_optional("PORT", Some(8080.0)); // optional number
//! let verbose = env_boolean("VERBOSE", false);         // "true" / "1" => true
//! # let _ = (api_key, port, verbose);
//! ```

use crate::spec::{ConfigSpec, ErrorSink};
use anyhow::{anyhow, ensure};
use serde::de::DeserializeOwned;
use std::env::{self, VarError};
use std::fmt;
use std::str::FromStr;

type Transform<T> = Box<dyn Fn(&str) -> anyhow::Result<T> + Send + Sync>;

/// Resolve a value from one environment variable
///
/// Resolution order:
/// 1. A required spec whose variable is unset or empty fails with `Missing required env`.
/// 2. A set variable is passed through the transform; a rejected value fails with
///    `Failed to transform`.
/// 3. An unset optional variable resolves to the default.
///
/// The environment is read again on every resolution; nothing is cached here.
pub struct EnvSpec<T> {
    key: String,
    required: bool,
    default: Option<T>,
    transform: Transform<T>,
}

impl<T> EnvSpec<T> {
    /// A spec that fails when the variable is unset
    pub fn required<F>(key: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            required: true,
            default: None,
            transform: Box::new(transform),
        }
    }

    /// A spec that falls back to `default` when the variable is unset
    pub fn optional<F>(key: impl Into<String>, default: T, transform: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            required: false,
            default: Some(default),
            transform: Box::new(transform),
        }
    }

    /// Attach a default value
    ///
    /// On a required spec the default is never consulted: a missing variable is still
    /// an error.
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    fn read_raw(&self, errors: &mut ErrorSink) -> Result<Option<String>, ()> {
        match env::var(&self.key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => {
                errors.push(format!(
                    "Failed to transform {}: value is not valid unicode",
                    self.key
                ));
                Err(())
            }
        }
    }
}

impl<T: Clone> ConfigSpec for EnvSpec<T> {
    type Value = T;

    fn kind(&self) -> &'static str {
        "env"
    }

    fn resolve(&self, errors: &mut ErrorSink) -> Option<T> {
        let raw = self.read_raw(errors).ok()?;

        // An empty value counts as missing for required keys
        if self.required && raw.as_deref().map_or(true, str::is_empty) {
            errors.push(format!("Missing required env: {}", self.key));
            return None;
        }

        match raw {
            Some(raw) => match (self.transform)(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    errors.push(format!("Failed to transform {}: {:#}", self.key, e));
                    None
                }
            },
            None => self.default.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for EnvSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSpec")
            .field("key", &self.key)
            .field("required", &self.required)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Required string
pub fn env(key: impl Into<String>) -> EnvSpec<String> {
    EnvSpec::required(key, |raw| Ok(raw.to_owned()))
}

/// Optional string, `default` when unset
pub fn env_optional(key: impl Into<String>, default: Option<&str>) -> EnvSpec<Option<String>> {
    EnvSpec::optional(key, default.map(str::to_owned), |raw| {
        Ok(Some(raw.to_owned()))
    })
}

/// Required number
///
/// A value that does not parse as a number is a transform failure.
pub fn env_number(key: impl Into<String>) -> EnvSpec<f64> {
    EnvSpec::required(key, parse_number)
}

/// Optional number; an empty value resolves to `None`
pub fn env_number_optional(key: impl Into<String>, default: Option<f64>) -> EnvSpec<Option<f64>> {
    EnvSpec::optional(key, default, |raw| {
        if raw.is_empty() {
            Ok(None)
        } else {
            parse_number(raw).map(Some)
        }
    })
}

/// Boolean flag: `"true"` and `"1"` are true, anything else is false
pub fn env_boolean(key: impl Into<String>, default: bool) -> EnvSpec<bool> {
    EnvSpec::optional(key, default, |raw| Ok(raw == "true" || raw == "1"))
}

/// Required JSON document
pub fn env_json<T>(key: impl Into<String>) -> EnvSpec<T>
where
    T: DeserializeOwned + 'static,
{
    EnvSpec::required(key, |raw| Ok(serde_json::from_str(raw)?))
}

/// Optional JSON document; an empty value or `null` resolves to `None`
pub fn env_json_optional<T>(key: impl Into<String>, default: Option<T>) -> EnvSpec<Option<T>>
where
    T: DeserializeOwned + 'static,
{
    EnvSpec::optional(key, default, |raw| {
        if raw.is_empty() {
            Ok(None)
        } else {
            Ok(serde_json::from_str::<Option<T>>(raw)?)
        }
    })
}

/// Required value parsed with [`FromStr`], e.g. a `u16` port or a `SocketAddr`
pub fn env_parse<T>(key: impl Into<String>) -> EnvSpec<T>
where
    T: FromStr + 'static,
    T::Err: fmt::Display,
{
    EnvSpec::required(key, parse_from_str)
}

/// Optional value parsed with [`FromStr`], `default` when unset
pub fn env_parse_optional<T>(key: impl Into<String>, default: T) -> EnvSpec<T>
where
    T: FromStr + 'static,
    T::Err: fmt::Display,
{
    EnvSpec::optional(key, default, parse_from_str)
}

fn parse_number(raw: &str) -> anyhow::Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid number '{}'", raw))?;
    ensure!(!value.is_nan(), "invalid number '{}'", raw);
    Ok(value)
}

fn parse_from_str<T>(raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| anyhow!("invalid value '{}': {}", raw, e))
}
