//! Named loader registry.
//!
//! A node's configuration names its segment loader with a plain string.
//! The registry maps those identifiers to factories; it is populated once
//! at process startup and consulted when a data manager is initialized.

use crate::cbor::CborLoader;
use crate::loader::SegmentLoader;
use crate::properties::PropertiesLoader;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of the built-in [`PropertiesLoader`].
pub const PROPERTIES_LOADER: &str = "properties";

/// Identifier of the built-in [`CborLoader`].
pub const CBOR_LOADER: &str = "cbor";

/// Factory producing a loader instance.
pub type LoaderFactory = Arc<dyn Fn() -> Arc<dyn SegmentLoader> + Send + Sync>;

/// Maps loader identifiers to factories.
///
/// # Example
///
/// ```rust
/// use stratum_segment::{LoaderRegistry, PropertiesLoader};
/// use std::sync::Arc;
///
/// let mut registry = LoaderRegistry::new();
/// registry.register("legacy", || Arc::new(PropertiesLoader::new()));
///
/// assert!(registry.resolve("legacy").is_some());
/// assert!(registry.resolve("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    factories: BTreeMap<String, LoaderFactory>,
}

impl LoaderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in loaders.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PROPERTIES_LOADER, || Arc::new(PropertiesLoader::new()));
        registry.register(CBOR_LOADER, || Arc::new(CborLoader::new()));
        registry
    }

    /// Registers a factory, replacing any previous one with the same id.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn SegmentLoader> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
    }

    /// Builds the loader registered under `id`.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn SegmentLoader>> {
        self.factories.get(id.trim()).map(|factory| factory())
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id.trim())
    }

    /// Returns the registered identifiers in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.names())
            .finish()
    }
}
