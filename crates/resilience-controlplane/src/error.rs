//! Error type for control-plane operations, mapped to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Errors raised while looking up or updating a registered component.
#[derive(Debug, thiserror::Error)]
pub enum ControlPlaneError {
    /// No component is registered under `(kind, name)`.
    #[error("no component registered for kind={kind:?} name={name:?}")]
    NotFound { kind: String, name: String },

    /// A `PUT /config` body named a field that isn't in the whitelist for
    /// this component's kind.
    #[error("unknown config field {field:?}")]
    UnknownConfigField { field: String },

    /// A `PUT /config` body named a whitelisted field but gave it a value
    /// the component rejects (wrong type, out of range).
    #[error("invalid value for config field {field:?}: {reason}")]
    InvalidConfigValue { field: String, reason: String },
}

impl ControlPlaneError {
    fn status(&self) -> StatusCode {
        match self {
            ControlPlaneError::NotFound { .. } => StatusCode::NOT_FOUND,
            ControlPlaneError::UnknownConfigField { .. }
            | ControlPlaneError::InvalidConfigValue { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ControlPlaneError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": match &self {
                ControlPlaneError::NotFound { .. } => "not_found",
                ControlPlaneError::UnknownConfigField { .. } => "unknown_config_field",
                ControlPlaneError::InvalidConfigValue { .. } => "invalid_config_value",
            },
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
