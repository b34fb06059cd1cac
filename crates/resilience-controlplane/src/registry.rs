//! The process-wide component index.

use crate::component::{ComponentHandle, ComponentSummary};
use crate::error::ControlPlaneError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Indexes every live resilience component by `(kind, name)`.
///
/// The registry is process-wide in the sense that there is normally one per
/// running service, but it is never a hidden global: the embedding
/// application owns it as an `Arc<Registry>` and passes it to both the
/// component constructors (to register) and [`router`](crate::router) (to
/// expose it over HTTP). Lookups take a read lock; register/deregister take
/// a write lock. No component's own mutex is ever held while the registry's
/// lock is held.
#[derive(Default)]
pub struct Registry {
    components: RwLock<HashMap<(String, String), Arc<dyn ComponentHandle>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a component under `(kind, name)`. Replaces any existing
    /// registration with the same key.
    pub fn register(&self, handle: Arc<dyn ComponentHandle>) {
        let key = (handle.kind().to_string(), handle.name().to_string());
        self.components.write().insert(key, handle);
    }

    /// Removes a component's registration. No-op if absent.
    pub fn deregister(&self, kind: &str, name: &str) {
        self.components
            .write()
            .remove(&(kind.to_string(), name.to_string()));
    }

    /// Returns a summary of every registered component, for `GET /patterns`.
    pub fn list(&self) -> Vec<ComponentSummary> {
        self.components
            .read()
            .values()
            .map(|c| ComponentSummary {
                kind: c.kind().to_string(),
                name: c.name().to_string(),
                enabled: c.enabled(),
            })
            .collect()
    }

    /// Looks up a single component, or `NotFound`.
    pub fn get(&self, kind: &str, name: &str) -> Result<Arc<dyn ComponentHandle>, ControlPlaneError> {
        self.components
            .read()
            .get(&(kind.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ControlPlaneError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            })
    }
}
