//! Spec trait, error sink and schema entries
//!
//! A spec is a deferred description of how to produce one configuration value. Any type
//! implementing [`ConfigSpec`] can appear in a schema; the resolution engine only talks
//! to the trait, so new spec kinds need no registration.
//!
//! [`SchemaEntry`] is the type-level mapping from a schema value to the resolved field:
//! a spec produces its `Value`, a plain value produces itself.

use crate::error::ConfigValidationError;
use std::sync::Arc;

/// Append-only collector of resolution failure messages
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorSink {
    messages: Vec<String>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Convert the collected messages into the aggregate error, if any were recorded
    pub fn into_error(self) -> Option<ConfigValidationError> {
        ConfigValidationError::from_messages(self.messages)
    }
}

/// A value that can be resolved at configuration time
///
/// `resolve` must not fail loudly for the failures a spec expects (missing keys,
/// rejected transforms, failing factories). It pushes a human readable message onto
/// `errors` and returns `None` instead, so one pass can report every problem.
pub trait ConfigSpec {
    /// Type of the resolved value
    type Value;

    /// Short tag naming the spec variant, e.g. `"env"` or `"computed"`
    fn kind(&self) -> &'static str;

    /// Produce the value, or record why it could not be produced
    fn resolve(&self, errors: &mut ErrorSink) -> Option<Self::Value>;
}

impl<S: ConfigSpec + ?Sized> ConfigSpec for Box<S> {
    type Value = S::Value;

    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn resolve(&self, errors: &mut ErrorSink) -> Option<Self::Value> {
        (**self).resolve(errors)
    }
}

impl<S: ConfigSpec + ?Sized> ConfigSpec for Arc<S> {
    type Value = S::Value;

    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn resolve(&self, errors: &mut ErrorSink) -> Option<Self::Value> {
        (**self).resolve(errors)
    }
}

/// Anything that may appear as a value in a schema
///
/// Specs are entries through a blanket impl and produce their resolved value. Plain
/// values are entries that pass themselves through unchanged.
pub trait SchemaEntry {
    /// Type of the field in the resolved configuration
    type Output;

    /// `Some(kind)` for specs, `None` for plain values
    fn spec_kind(&self) -> Option<&'static str>;

    fn produce(&self, errors: &mut ErrorSink) -> Option<Self::Output>;

    fn is_spec(&self) -> bool {
        self.spec_kind().is_some()
    }
}

impl<S: ConfigSpec> SchemaEntry for S {
    type Output = S::Value;

    fn spec_kind(&self) -> Option<&'static str> {
        Some(self.kind())
    }

    fn produce(&self, errors: &mut ErrorSink) -> Option<Self::Output> {
        self.resolve(errors)
    }
}

/// Plain value wrapper for types without a built-in [`SchemaEntry`] impl
#[derive(Debug, Clone, PartialEq)]
pub struct Literal<T>(pub T);

/// Wrap a plain value so it can sit in a schema
pub fn literal<T: Clone>(value: T) -> Literal<T> {
    Literal(value)
}

impl<T: Clone> SchemaEntry for Literal<T> {
    type Output = T;

    fn spec_kind(&self) -> Option<&'static str> {
        None
    }

    fn produce(&self, _errors: &mut ErrorSink) -> Option<T> {
        Some(self.0.clone())
    }
}

macro_rules! literal_entry {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SchemaEntry for $ty {
                type Output = $ty;

                fn spec_kind(&self) -> Option<&'static str> {
                    None
                }

                fn produce(&self, _errors: &mut ErrorSink) -> Option<$ty> {
                    Some(self.clone())
                }
            }
        )*
    };
}

literal_entry!(
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    serde_json::Value,
);

impl<T: Clone> SchemaEntry for Option<T> {
    type Output = Option<T>;

    fn spec_kind(&self) -> Option<&'static str> {
        None
    }

    fn produce(&self, _errors: &mut ErrorSink) -> Option<Option<T>> {
        Some(self.clone())
    }
}

impl<T: Clone> SchemaEntry for Vec<T> {
    type Output = Vec<T>;

    fn spec_kind(&self) -> Option<&'static str> {
        None
    }

    fn produce(&self, _errors: &mut ErrorSink) -> Option<Vec<T>> {
        Some(self.clone())
    }
}
