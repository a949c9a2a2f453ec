//! Command dispatch: bridges CLI args -> core pipeline -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod devices;
pub mod generate;
pub mod manifest;
pub mod validate;

use std::sync::Arc;

use remotegen_config::Config;
use remotegen_core::{ConfigSource, DeviceGenerator, Introspector};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a config-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Generate(args) => generate::handle(args, cfg, global).await,
        Command::Validate(args) => validate::handle(args, cfg, global).await,
        Command::Manifest(args) => manifest::handle(args, cfg, global).await,
        Command::Devices(args) => devices::handle(args, cfg, global).await,
        Command::Check => check::handle(cfg, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Generator over `source` with the subprocess schema introspector.
fn generator(cfg: &Config, source: Arc<dyn ConfigSource>) -> DeviceGenerator {
    DeviceGenerator::new(
        source,
        &cfg.generator_config(),
        Introspector::subprocess(cfg.introspector_config()),
    )
}
