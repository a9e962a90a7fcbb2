//! Schemas: ordered collections of entries that resolve into one configuration value
//!
//! Two flavors are provided:
//!
//! - [`define_schema!`](crate::define_schema) declares a struct whose field types are
//!   checked against the entries at compile time.
//! - [`DynamicSchema`] is keyed by strings at runtime and resolves into an ordered JSON map.

use crate::spec::{ConfigSpec, ErrorSink, SchemaEntry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, trace};

/// A schema that can be resolved into its configuration value
pub trait Schema {
    /// The resolved configuration
    type Resolved;

    /// Attempt every entry once, in declaration order
    ///
    /// Failures are pushed onto `errors`. The result is `Some` only when no entry failed.
    fn resolve(&self, errors: &mut ErrorSink) -> Option<Self::Resolved>;
}

/// Boxed entry producing a field of type `T`
pub type BoxedEntry<T> = Box<dyn SchemaEntry<Output = T> + Send + Sync>;

/// Box an entry, fixing its output type
///
/// Used by [`define_schema!`](crate::define_schema): an entry whose output disagrees with
/// the declared field type fails to compile here.
pub fn entry<T, E>(entry: E) -> BoxedEntry<T>
where
    E: SchemaEntry<Output = T> + Send + Sync + 'static,
{
    Box::new(entry)
}

/// Resolve a single keyed entry
///
/// Plain values pass through. A spec that returns no value without recording why is
/// reported against its key, so a resolution can never succeed with a hole in it.
pub fn resolve_field<T>(
    key: &str,
    entry: &(dyn SchemaEntry<Output = T> + Send + Sync),
    errors: &mut ErrorSink,
) -> Option<T> {
    let Some(kind) = entry.spec_kind() else {
        return entry.produce(errors);
    };

    let before = errors.len();
    let value = entry.produce(errors);
    if value.is_none() && errors.len() == before {
        errors.push(format!("{}: spec `{}` produced no value", key, kind));
    }

    if errors.len() > before {
        debug!(key, kind, "config entry failed to resolve");
    } else {
        trace!(key, kind, "config entry resolved");
    }

    value
}

/// Schema generated by [`define_schema!`](crate::define_schema)
pub struct StructSchema<C> {
    name: &'static str,
    fields: &'static [&'static str],
    resolver: Box<dyn Fn(&mut ErrorSink) -> Option<C> + Send + Sync>,
}

impl<C> StructSchema<C> {
    #[doc(hidden)]
    pub fn new<F>(name: &'static str, fields: &'static [&'static str], resolver: F) -> Self
    where
        F: Fn(&mut ErrorSink) -> Option<C> + Send + Sync + 'static,
    {
        Self {
            name,
            fields,
            resolver: Box::new(resolver),
        }
    }

    /// Name of the generated configuration struct
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field names in declaration order
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }
}

impl<C> Schema for StructSchema<C> {
    type Resolved = C;

    fn resolve(&self, errors: &mut ErrorSink) -> Option<C> {
        let before = errors.len();
        let resolved = (self.resolver)(errors);
        if errors.len() > before {
            return None;
        }
        resolved
    }
}

impl<C> fmt::Debug for StructSchema<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Declare a configuration struct together with the schema that produces it
///
/// Each field is written `name: Type = entry`, where `entry` is a spec whose value type
/// is `Type` or a plain value of type `Type`. Fields resolve in declaration order.
///
/// ```
/// use cfgspec::{computed_value, define_schema, env_boolean};
///
/// define_schema! {
///     #[derive(Debug)]
///     pub struct AppConfig {
///         pub app_name: &'static str = "my-app",
///         pub debug: bool = env_boolean("APP_DEBUG", false),
///         pub workers: usize = computed_value(|| 4usize),
///     }
/// }
///
/// let schema = AppConfig::schema();
/// assert_eq!(schema.fields(), ["app_name", "debug", "workers"]);
/// ```
#[macro_export]
macro_rules! define_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty = $entry:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $name {
            /// Schema producing this configuration
            $vis fn schema() -> $crate::schema::StructSchema<$name> {
                $(
                    let $field: $crate::schema::BoxedEntry<$ty> = $crate::schema::entry($entry);
                )*

                #[allow(unused_variables)]
                let resolver = move |errors: &mut $crate::ErrorSink| -> ::std::option::Option<$name> {
                    $(
                        let $field = $crate::schema::resolve_field(
                            ::std::stringify!($field),
                            &*$field,
                            errors,
                        );
                    )*
                    ::std::option::Option::Some($name {
                        $( $field: $field?, )*
                    })
                };

                $crate::schema::StructSchema::new(
                    ::std::stringify!($name),
                    &[$( ::std::stringify!($field) ),*],
                    resolver,
                )
            }
        }
    };
}

/// Schema keyed by strings at runtime
///
/// Resolves into an ordered JSON object with the same keys in insertion order. Specs are
/// stored behind an adapter that serializes their value.
#[derive(Default)]
pub struct DynamicSchema {
    entries: Vec<(String, BoxedEntry<Value>)>,
}

impl DynamicSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain value
    pub fn literal(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value: Value = value.into();
        self.insert(key.into(), Box::new(value))
    }

    /// Add a spec whose value can be serialized
    pub fn spec<S>(self, key: impl Into<String>, spec: S) -> Self
    where
        S: ConfigSpec + Send + Sync + 'static,
        S::Value: Serialize,
    {
        let key = key.into();
        let adapter = JsonSpec {
            key: key.clone(),
            inner: spec,
        };
        self.insert(key, Box::new(adapter))
    }

    /// Keys in resolution order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replacing an existing key keeps its original position
    fn insert(mut self, key: String, entry: BoxedEntry<Value>) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
        self
    }
}

impl Schema for DynamicSchema {
    type Resolved = Map<String, Value>;

    fn resolve(&self, errors: &mut ErrorSink) -> Option<Self::Resolved> {
        let before = errors.len();
        let mut resolved = Map::new();
        for (key, entry) in &self.entries {
            if let Some(value) = resolve_field(key, &**entry, errors) {
                resolved.insert(key.clone(), value);
            }
        }

        if errors.len() > before {
            None
        } else {
            Some(resolved)
        }
    }
}

impl fmt::Debug for DynamicSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.spec_kind().unwrap_or("literal")))
            .collect();
        f.debug_struct("DynamicSchema")
            .field("entries", &entries)
            .finish()
    }
}

/// Serializes a spec's value so it can live in a [`DynamicSchema`]
struct JsonSpec<S> {
    key: String,
    inner: S,
}

impl<S> ConfigSpec for JsonSpec<S>
where
    S: ConfigSpec,
    S::Value: Serialize,
{
    type Value = Value;

    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn resolve(&self, errors: &mut ErrorSink) -> Option<Value> {
        let value = self.inner.resolve(errors)?;
        match serde_json::to_value(value) {
            Ok(json) => Some(json),
            Err(e) => {
                errors.push(format!("Failed to serialize {}: {}", self.key, e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computed::{computed, computed_value};
    use crate::env::{env, env_boolean, env_number};
    use crate::test_support::{env_lock, EnvVarGuard};
    use anyhow::bail;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    define_schema! {
        #[derive(Debug, Clone, PartialEq)]
        struct ServiceConfig {
            api_key: String = env("CFGSPEC_SCHEMA_API_KEY"),
            app_name: &'static str = "my-app",
            verbose: bool = env_boolean("CFGSPEC_SCHEMA_VERBOSE", false),
            retries: u32 = 3u32,
        }
    }

    define_schema! {
        struct Empty {}
    }

    struct Silent;

    impl ConfigSpec for Silent {
        type Value = u8;

        fn kind(&self) -> &'static str {
            "silent"
        }

        fn resolve(&self, _errors: &mut ErrorSink) -> Option<u8> {
            None
        }
    }

    #[test]
    fn test_struct_schema_resolves() {
        let _lock = env_lock();
        let _key = EnvVarGuard::set("CFGSPEC_SCHEMA_API_KEY", "secret");
        let _verbose = EnvVarGuard::set("CFGSPEC_SCHEMA_VERBOSE", "1");

        let schema = ServiceConfig::schema();
        let mut sink = ErrorSink::new();
        let config = schema.resolve(&mut sink).unwrap();
        assert_eq!(
            config,
            ServiceConfig {
                api_key: "secret".into(),
                app_name: "my-app",
                verbose: true,
                retries: 3,
            }
        );
        assert!(sink.is_empty());
        assert_eq!(schema.name(), "ServiceConfig");
        assert_eq!(schema.fields(), ["api_key", "app_name", "verbose", "retries"]);
    }

    #[test]
    fn test_struct_schema_fails_as_a_whole() {
        let _lock = env_lock();
        let _key = EnvVarGuard::unset("CFGSPEC_SCHEMA_API_KEY");

        let mut sink = ErrorSink::new();
        assert!(ServiceConfig::schema().resolve(&mut sink).is_none());
        assert_eq!(sink.messages(), ["Missing required env: CFGSPEC_SCHEMA_API_KEY"]);
    }

    #[test]
    fn test_empty_schema() {
        let mut sink = ErrorSink::new();
        assert!(Empty::schema().resolve(&mut sink).is_some());
        assert!(Empty::schema().fields().is_empty());

        let resolved = DynamicSchema::new().resolve(&mut sink).unwrap();
        assert!(resolved.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_every_entry_attempted_in_order() {
        let _lock = env_lock();
        let _port = EnvVarGuard::set("CFGSPEC_SCHEMA_PORT", "eighty");
        let _host = EnvVarGuard::unset("CFGSPEC_SCHEMA_HOST");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let schema = DynamicSchema::new()
            .spec("host", env("CFGSPEC_SCHEMA_HOST"))
            .literal("name", "svc")
            .spec(
                "broken",
                computed(|| -> anyhow::Result<String> { bail!("x") }),
            )
            .spec(
                "counted",
                computed_value(move || counter.fetch_add(1, Ordering::SeqCst)),
            )
            .spec("port", env_number("CFGSPEC_SCHEMA_PORT"));

        let mut sink = ErrorSink::new();
        assert!(schema.resolve(&mut sink).is_none());
        assert_eq!(
            sink.messages(),
            [
                "Missing required env: CFGSPEC_SCHEMA_HOST",
                "Computed value failed: x",
                "Failed to transform CFGSPEC_SCHEMA_PORT: invalid number 'eighty'",
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_literals_only_pass_through() {
        let schema = DynamicSchema::new()
            .literal("name", "svc")
            .literal("port", 8080)
            .literal("tags", json!(["a", "b"]))
            .literal("nothing", Value::Null);

        let mut sink = ErrorSink::new();
        let resolved = schema.resolve(&mut sink).unwrap();
        assert_eq!(
            Value::Object(resolved),
            json!({"name": "svc", "port": 8080, "tags": ["a", "b"], "nothing": null})
        );
    }

    #[test]
    fn test_dynamic_keys_keep_declaration_order() {
        let schema = DynamicSchema::new()
            .literal("zeta", 1)
            .literal("alpha", 2)
            .literal("mid", 3)
            .literal("zeta", 4);

        assert_eq!(schema.keys().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
        assert_eq!(schema.len(), 3);

        let mut sink = ErrorSink::new();
        let resolved = schema.resolve(&mut sink).unwrap();
        let keys: Vec<_> = resolved.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(resolved["zeta"], json!(4));
    }

    #[test]
    fn test_silent_spec_is_reported() {
        let schema = DynamicSchema::new().spec("level", Silent);
        let mut sink = ErrorSink::new();
        assert!(schema.resolve(&mut sink).is_none());
        assert_eq!(sink.messages(), ["level: spec `silent` produced no value"]);
    }

    #[test]
    fn test_debug_lists_entry_kinds() {
        let schema = DynamicSchema::new()
            .literal("name", "svc")
            .spec("root", computed_value(|| "/srv".to_string()));
        let debug = format!("{:?}", schema);
        assert!(debug.contains("\"literal\""));
        assert!(debug.contains("\"computed\""));
    }
}
