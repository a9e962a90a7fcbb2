//! Specs backed by a factory function

use crate::spec::{ConfigSpec, ErrorSink};
use std::fmt;

type Factory<T> = Box<dyn Fn() -> anyhow::Result<T> + Send + Sync>;

/// Resolve to whatever the factory returns
///
/// The factory runs once per resolution pass and its result is not memoized here.
/// A failing factory is recorded as `Computed value failed: <message>`.
pub struct ComputedSpec<T> {
    factory: Factory<T>,
}

impl<T> ComputedSpec<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }
}

impl<T> ConfigSpec for ComputedSpec<T> {
    type Value = T;

    fn kind(&self) -> &'static str {
        "computed"
    }

    fn resolve(&self, errors: &mut ErrorSink) -> Option<T> {
        match (self.factory)() {
            Ok(value) => Some(value),
            Err(e) => {
                errors.push(format!("Computed value failed: {:#}", e));
                None
            }
        }
    }
}

impl<T> fmt::Debug for ComputedSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedSpec").finish_non_exhaustive()
    }
}

/// Value produced by a fallible factory
pub fn computed<T, F>(factory: F) -> ComputedSpec<T>
where
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
{
    ComputedSpec::new(factory)
}

/// Value produced by a factory that cannot fail
pub fn computed_value<T, F>(factory: F) -> ComputedSpec<T>
where
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    ComputedSpec::new(move || Ok(factory()))
}
