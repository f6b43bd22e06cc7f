//! Backend registry
//!
//! Built once before traffic, then shared read-only behind an `Arc`.

use crate::adapter::BackendAdapter;
use crate::capability::BackendDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registered generation backends, in registration order
#[derive(Default, Clone)]
pub struct BackendRegistry {
    adapters: Vec<Arc<dyn BackendAdapter>>,
    index: HashMap<String, usize>,
}

impl BackendRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id
    ///
    /// Re-registering an id replaces the adapter but keeps its position.
    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        let id = adapter.id().to_string();
        if let Some(&slot) = self.index.get(&id) {
            warn!(backend = %id, "Replacing already registered backend");
            self.adapters[slot] = adapter;
        } else {
            debug!(backend = %id, "Registering generation backend");
            self.index.insert(id, self.adapters.len());
            self.adapters.push(adapter);
        }
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Get an adapter by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn BackendAdapter>> {
        self.index.get(id).map(|&slot| &self.adapters[slot])
    }

    /// Whether an id is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Adapters in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn BackendAdapter>> {
        self.adapters.iter()
    }

    /// Ids in registration order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    /// Descriptors in registration order
    #[must_use]
    pub fn descriptors(&self) -> Vec<BackendDescriptor> {
        self.adapters.iter().map(|a| a.descriptor()).collect()
    }

    /// Number of registered backends
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no backend is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.ids())
            .finish()
    }
}
