//! Bridges the config file, CLI overrides and the core runtime.
//!
//! `resolve` layers command-line flags over the loaded `Config`;
//! `build_source` turns the result into a concrete `ConfigSource`.

use std::sync::Arc;

use secrecy::SecretString;

use remotegen_api::ConfigServiceClient;
use remotegen_config::{Config, SourceKind};
use remotegen_core::{ConfigSource, LocalSource, RemoteSource};

use crate::cli::{GlobalOpts, SourceArg};
use crate::error::CliError;

/// Load the layered config and apply global flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = remotegen_config::load_config(global.config.as_deref())?;
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref mapping) = global.mapping {
        cfg.source.mapping_file.clone_from(mapping);
    }
    if let Some(ref url) = global.url {
        cfg.source.url = Some(url.clone());
        cfg.source.kind = SourceKind::Remote;
    }
    match global.source {
        Some(SourceArg::Local) => cfg.source.kind = SourceKind::Local,
        Some(SourceArg::Remote) => cfg.source.kind = SourceKind::Remote,
        None => {}
    }
    if global.insecure {
        cfg.source.insecure = true;
    }
    if let Some(ref dir) = global.output_dir {
        cfg.output.dir.clone_from(dir);
    }
}

/// Bearer token: `--token` flag first, then the config file.
fn token(cfg: &Config, global: &GlobalOpts) -> Option<SecretString> {
    global
        .token
        .clone()
        .map(SecretString::from)
        .or_else(|| remotegen_config::resolve_token(&cfg.source))
}

/// Build the configuration source selected by `cfg`.
pub async fn build_source(
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<Arc<dyn ConfigSource>, CliError> {
    match cfg.source.kind {
        SourceKind::Local => {
            let source = LocalSource::open(&cfg.source.mapping_file).await?;
            Ok(Arc::new(source))
        }
        SourceKind::Remote => {
            let url = cfg.source.url.as_deref().ok_or_else(|| CliError::Validation {
                field: "source.url".into(),
                reason: "required for the remote source".into(),
            })?;
            let client =
                ConfigServiceClient::new(url, token(cfg, global).as_ref(), &cfg.transport_config())
                    .map_err(|e| CliError::ConnectionFailed {
                        source_name: url.to_owned(),
                        reason: e.to_string(),
                    })?;
            tracing::debug!(url, "using configuration service");
            Ok(Arc::new(RemoteSource::new(client)))
        }
    }
}
