//! Configuration for the remotegen CLI.
//!
//! Layered TOML + environment loading, token resolution, and translation
//! into the runtime configs `remotegen_core` consumes. Core never reads
//! configuration files itself; the CLI goes through this crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use remotegen_api::{TlsMode, TransportConfig};
use remotegen_core::{
    BatchOptions, GeneratorConfig, IntrospectorConfig, RecoveryPolicy, ValidatorConfig,
};

/// Project-local config file, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "remotegen.toml";

const ENV_PREFIX: &str = "REMOTEGEN_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub output: OutputSection,
    pub batch: BatchSection,
    pub schema: SchemaSection,
    pub validation: ValidationSection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Mapping file of device id → config file path.
    #[default]
    Local,
    /// Configuration service over HTTP.
    Remote,
}

/// Where device configurations come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSection {
    pub kind: SourceKind,

    /// Mapping file for the local source.
    pub mapping_file: PathBuf,

    /// Service base URL for the remote source (e.g., "http://hub.local:8080").
    pub url: Option<String>,

    /// Bearer token (plaintext; prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    pub timeout_secs: u64,

    /// Accept invalid TLS certificates.
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::Local,
            mapping_file: PathBuf::from("devices.json"),
            url: None,
            token: None,
            token_env: None,
            timeout_secs: 15,
            insecure: false,
            ca_cert: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    pub state_hooks: bool,
    pub docs: bool,
    pub components_import: String,
    pub hooks_import: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        let core = GeneratorConfig::default();
        Self {
            dir: core.output_dir,
            state_hooks: core.state_hooks,
            docs: core.docs,
            components_import: core.components_import,
            hooks_import: core.hooks_import,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchSection {
    pub concurrency: usize,
    pub batch_delay_ms: u64,
    pub continue_on_error: bool,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for BatchSection {
    fn default() -> Self {
        let core = BatchOptions::default();
        Self {
            concurrency: core.max_concurrency,
            batch_delay_ms: millis(core.batch_delay),
            continue_on_error: core.continue_on_error,
            max_retries: core.recovery.max_retries,
            base_delay_ms: millis(core.recovery.base_delay),
            max_backoff_ms: millis(core.recovery.max_backoff),
        }
    }
}

/// How shared state schemas are introspected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSection {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for SchemaSection {
    fn default() -> Self {
        let core = IntrospectorConfig::default();
        Self {
            command: core.command,
            args: core.args,
            timeout_secs: core.timeout.as_secs(),
        }
    }
}

/// Post-generation validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationSection {
    /// Validate after every generated device (the `--validate` flag forces it).
    pub enabled: bool,
    pub compiler: String,
    pub args: Vec<String>,
    pub ignored_globals: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ValidationSection {
    fn default() -> Self {
        let core = ValidatorConfig::default();
        Self {
            enabled: false,
            compiler: core.compiler,
            args: core.args,
            ignored_globals: core.ignored_globals,
            timeout_secs: core.timeout.as_secs(),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the user config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "remotegen", "remotegen").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("remotegen");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered figment: defaults → user file → `./remotegen.toml` → explicit
/// file → `REMOTEGEN_*` environment (nested keys split on `__`).
fn figment(user_file: Option<&Path>, explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
    if let Some(path) = user_file {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Toml::file(LOCAL_CONFIG_FILE));
    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full config. `explicit` is the `--config` file, which must
/// exist when given.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }
    let config: Config = figment(Some(&config_path()), explicit).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at `path` (default: the user config path).
/// Returns the path written.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.concurrency == 0 {
            return Err(invalid("batch.concurrency", "must be at least 1"));
        }
        if self.source.kind == SourceKind::Remote {
            let url = self
                .source
                .url
                .as_deref()
                .ok_or_else(|| invalid("source.url", "required for the remote source"))?;
            url::Url::parse(url).map_err(|e| invalid("source.url", format!("{url}: {e}")))?;
        }
        if self.schema.command.trim().is_empty() {
            return Err(invalid("schema.command", "must not be empty"));
        }
        Ok(())
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            output_dir: self.output.dir.clone(),
            state_hooks: self.output.state_hooks,
            docs: self.output.docs,
            components_import: self.output.components_import.clone(),
            hooks_import: self.output.hooks_import.clone(),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            max_concurrency: self.batch.concurrency,
            continue_on_error: self.batch.continue_on_error,
            batch_delay: Duration::from_millis(self.batch.batch_delay_ms),
            recovery: RecoveryPolicy {
                max_retries: self.batch.max_retries,
                base_delay: Duration::from_millis(self.batch.base_delay_ms),
                max_backoff: Duration::from_millis(self.batch.max_backoff_ms),
            },
        }
    }

    pub fn introspector_config(&self) -> IntrospectorConfig {
        IntrospectorConfig {
            command: self.schema.command.clone(),
            args: self.schema.args.clone(),
            timeout: Duration::from_secs(self.schema.timeout_secs),
        }
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            compiler: self.validation.compiler.clone(),
            args: self.validation.args.clone(),
            ignored_globals: self.validation.ignored_globals.clone(),
            timeout: Duration::from_secs(self.validation.timeout_secs),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        let tls = if self.source.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.source.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.source.timeout_secs),
        }
    }
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the service token: `token_env` first, then plaintext `token`.
pub fn resolve_token(source: &SourceSection) -> Option<SecretString> {
    // 1. Named environment variable
    if let Some(ref env_name) = source.token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }

    // 2. Plaintext in config
    source.token.clone().map(SecretString::from)
}
