//! The trait every resilience component implements to participate in the
//! registry and its HTTP introspection surface.

use serde_json::Value;

/// Object-safe handle a resilience component exposes to the [`Registry`](crate::Registry).
///
/// A component registers one of these (usually `Arc<Self>`, with the
/// component's config and metrics behind its own interior mutability) rather
/// than the registry reaching into the component's private state. Enabling
/// and disabling a component only flips the gate bit the guard checks on
/// entry; it never resets counters, windows, or circuit state.
pub trait ComponentHandle: Send + Sync {
    /// The component kind, e.g. `"circuitbreaker"`, `"bulkhead"`, `"retry"`.
    fn kind(&self) -> &str;

    /// The instance name given at construction.
    fn name(&self) -> &str;

    /// Whether the component is currently enforcing its protection.
    fn enabled(&self) -> bool;

    /// Enables or disables enforcement. Disabled components pass every call
    /// straight through with no protection and no error.
    fn set_enabled(&self, enabled: bool);

    /// The component's current configuration, serialized for `GET /config`.
    fn config(&self) -> Value;

    /// Applies a whitelisted subset of configuration fields from a `PUT
    /// /config` body. Unknown fields are rejected with
    /// [`ControlPlaneError::UnknownConfigField`](crate::ControlPlaneError::UnknownConfigField);
    /// out-of-range values with
    /// [`ControlPlaneError::InvalidConfigValue`](crate::ControlPlaneError::InvalidConfigValue).
    fn update_config(&self, patch: Value) -> Result<(), crate::ControlPlaneError>;

    /// The component's current metrics snapshot, serialized for `GET /metrics`.
    fn metrics(&self) -> Value;

    /// Resets the component's metrics counters to zero, leaving its
    /// functional state (e.g. circuit breaker state, token bucket level)
    /// untouched.
    fn reset_metrics(&self);
}

/// Summary row returned by `GET /patterns`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ComponentSummary {
    pub kind: String,
    pub name: String,
    pub enabled: bool,
}
