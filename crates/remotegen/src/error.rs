//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use remotegen_config::ConfigError;
use remotegen_core::{CoreError, DeviceFamily};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Source ───────────────────────────────────────────────────────
    #[error("Could not reach {source_name}")]
    #[diagnostic(
        code(remotegen::connection_failed),
        help(
            "Check that the configuration source is available: {reason}\n\
             Try: remotegen check -v"
        )
    )]
    ConnectionFailed { source_name: String, reason: String },

    #[error("{operation} timed out after {seconds}s")]
    #[diagnostic(
        code(remotegen::timeout),
        help("Raise source.timeout_secs or schema.timeout_secs in the config file.")
    )]
    Timeout { operation: String, seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(remotegen::not_found), help("Run: remotegen {hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    #[error("Unsupported device class '{device_class}'")]
    #[diagnostic(
        code(remotegen::unsupported_class),
        help("Supported classes: {supported}")
    )]
    UnsupportedClass {
        device_class: String,
        supported: String,
    },

    // ── Generation ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(remotegen::pipeline))]
    Pipeline { message: String },

    #[error("No device was generated ({failed} failed, {skipped} skipped)")]
    #[diagnostic(
        code(remotegen::run_failed),
        help("Re-run with -v to see per-device errors.")
    )]
    RunFailed { failed: usize, skipped: usize },

    #[error("{errors} validation error(s) in {files} file(s)")]
    #[diagnostic(code(remotegen::validation_failed))]
    ValidationFailed { errors: usize, files: usize },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(remotegen::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(remotegen::no_config),
        help("Create one with: remotegen config init --path {path}")
    )]
    NoConfig { path: String },

    #[error("Configuration file already exists: {path}")]
    #[diagnostic(code(remotegen::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(remotegen::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(remotegen::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::UnsupportedClass { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::ConfigExists { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn supported_classes() -> String {
    DeviceFamily::ALL
        .into_iter()
        .map(DeviceFamily::tag)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed {
                source_name,
                reason,
            } => Self::ConnectionFailed {
                source_name,
                reason,
            },

            CoreError::Unauthorized { source_name } => Self::ConnectionFailed {
                source_name,
                reason: "credentials rejected, check the API token".into(),
            },

            CoreError::Timeout {
                operation,
                timeout_secs,
            } => Self::Timeout {
                operation,
                seconds: timeout_secs,
            },

            CoreError::DeviceNotFound { device_id } => Self::NotFound {
                resource_type: "Device".into(),
                identifier: device_id,
                hint: "devices list".into(),
            },

            CoreError::UnsupportedDeviceClass { device_class } => Self::UnsupportedClass {
                device_class,
                supported: supported_classes(),
            },

            CoreError::InvalidDeviceConfig { device_id, message } => Self::Validation {
                field: format!("device {device_id}"),
                reason: message,
            },

            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },

            other => Self::Pipeline {
                message: other.to_string(),
            },
        }
    }
}
