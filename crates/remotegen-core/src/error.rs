// ── Core error types ──
//
// Generation-level errors from remotegen-core. Consumers never see HTTP
// status codes or JSON parse failures directly: the
// `From<remotegen_api::Error>` impl translates transport-layer errors into
// source-level variants, and `recovery::ErrorType::of` folds every variant
// onto the closed recovery taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration source ─────────────────────────────────────────
    #[error("Connection to {source_name} failed: {reason}")]
    ConnectionFailed { source_name: String, reason: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },

    #[error("{source_name} rejected the credentials (check the service token)")]
    Unauthorized { source_name: String },

    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("Invalid configuration for device {device_id}: {message}")]
    InvalidDeviceConfig { device_id: String, message: String },

    #[error("Configuration service rejected the request: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Generation ───────────────────────────────────────────────────
    #[error("Unsupported device class: {device_class}")]
    UnsupportedDeviceClass { device_class: String },

    #[error("Template rendering failed: {message}")]
    Template { message: String },

    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema {schema_ref}: {message}")]
    Schema { schema_ref: String, message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<remotegen_api::Error> for CoreError {
    fn from(err: remotegen_api::Error) -> Self {
        match err {
            remotegen_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        operation: "Configuration service request".into(),
                        timeout_secs: 0,
                    }
                } else {
                    CoreError::ConnectionFailed {
                        source_name: e
                            .url()
                            .map_or_else(|| "configuration service".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            remotegen_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            remotegen_api::Error::Timeout { timeout_secs } => CoreError::Timeout {
                operation: "Configuration service request".into(),
                timeout_secs,
            },
            remotegen_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                source_name: "configuration service".into(),
                reason: format!("TLS error: {msg}"),
            },
            remotegen_api::Error::Unauthorized => CoreError::Unauthorized {
                source_name: "configuration service".into(),
            },
            remotegen_api::Error::NotFound { resource } => CoreError::DeviceNotFound {
                device_id: device_from_resource(&resource),
            },
            remotegen_api::Error::Service { status, message } if status >= 500 => {
                CoreError::ConnectionFailed {
                    source_name: "configuration service".into(),
                    reason: format!("HTTP {status}: {message}"),
                }
            }
            remotegen_api::Error::Service { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            remotegen_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("malformed response: {message}"),
                status: None,
            },
        }
    }
}

/// `devices/<id>/config` → `<id>`; anything else is returned unchanged.
fn device_from_resource(resource: &str) -> String {
    let mut parts = resource.split('/');
    match (parts.next(), parts.next()) {
        (Some("devices"), Some(id)) if !id.is_empty() => id.to_owned(),
        _ => resource.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_resource_maps_to_device_id() {
        let err: CoreError = remotegen_api::Error::NotFound {
            resource: "devices/living_room_tv/config".into(),
        }
        .into();
        assert!(matches!(
            err,
            CoreError::DeviceNotFound { ref device_id } if device_id == "living_room_tv"
        ));
    }

    #[test]
    fn unauthorized_is_its_own_variant() {
        let err: CoreError = remotegen_api::Error::Unauthorized.into();
        assert!(matches!(err, CoreError::Unauthorized { .. }));
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn server_errors_become_connection_failures() {
        let err: CoreError = remotegen_api::Error::Service {
            status: 503,
            message: "maintenance".into(),
        }
        .into();
        assert!(matches!(err, CoreError::ConnectionFailed { .. }));

        let err: CoreError = remotegen_api::Error::Service {
            status: 422,
            message: "bad id".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api { status: Some(422), .. }));
    }
}
