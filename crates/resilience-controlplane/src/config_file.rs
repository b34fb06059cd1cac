//! The `ResilienceFileConfig` document: a hierarchical configuration file
//! keyed by `{kind}.{name}`, loaded explicitly by the embedding application
//! and merged into per-component builders. The core crates never read the
//! filesystem themselves; this type only describes the document shape and
//! how to look a section up.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A parsed resilience configuration document.
///
/// Each top-level key is `"{kind}.{name}"` (e.g. `"bulkhead.db"`) and maps to
/// an object of constructor-parameter fields. Unknown keys in a section are
/// ignored rather than rejected, so older config files keep working against
/// a newer build that dropped a field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResilienceFileConfig {
    #[serde(flatten)]
    sections: HashMap<String, Value>,
}

impl ResilienceFileConfig {
    /// Parses a document from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Looks up the section for `{kind}.{name}`, if present.
    pub fn section(&self, kind: &str, name: &str) -> Option<&Value> {
        self.sections.get(&format!("{kind}.{name}"))
    }

    /// Looks up a single field within a `{kind}.{name}` section.
    pub fn field(&self, kind: &str, name: &str, field: &str) -> Option<&Value> {
        self.section(kind, name)?.as_object()?.get(field)
    }
}
