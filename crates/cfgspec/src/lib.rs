//! Typed configuration builder
//!
//! This crate turns a declarative schema into one resolved, immutable configuration:
//! - Specs describe deferred values (environment lookups, computed factories)
//! - Plain values pass through unchanged
//! - Every failure in a pass is collected into a single [`ConfigValidationError`]
//! - Resolved configurations are cached per accessor, with a test-mode bypass
//!
//! # Example
//!
//! ```no_run
//! use cfgspec::{computed_value, define_config, define_schema, env, ConfigOptions};
//!
//! define_schema! {
//!     #[derive(Debug)]
//!     pub struct AppConfig {
//!         pub api_key: String = env("API_KEY"),
//!         pub app_name: &'static str = "my-app",
//!         pub project_root: String = computed_value(|| "/srv/app".to_string()),
//!     }
//! }
//!
//! let config = define_config(AppConfig::schema(), ConfigOptions::new().with_load_env(true));
//!
//! // Resolves on first access, then served from the cache
//! let resolved = config.get()?;
//! println!("{} uses {}", resolved.app_name, resolved.project_root);
//! # Ok::<(), cfgspec::ConfigValidationError>(())
//! ```

pub mod computed;
pub mod database;
pub mod define;
pub mod dotenv;
pub mod env;
pub mod error;
pub mod schema;
pub mod spec;

// Re-export main types for convenience
pub use computed::{computed, computed_value, ComputedSpec};
pub use database::DatabaseConfig;
pub use define::{define_config, is_test_mode, CachePolicy, ConfigAccessor, ConfigOptions};
pub use dotenv::{load_env_files, EnvFileOptions, EnvFileReport};
pub use env::{
    env, env_boolean, env_json, env_json_optional, env_number, env_number_optional,
    env_optional, env_parse, env_parse_optional, EnvSpec,
};
pub use error::{ConfigValidationError, EnvFileError, ErrorFormatter, Result};
pub use schema::{DynamicSchema, Schema, StructSchema};
pub use spec::{literal, ConfigSpec, ErrorSink, Literal, SchemaEntry};
