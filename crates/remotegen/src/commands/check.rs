//! Reachability check for the configuration source.

use serde::Serialize;

use remotegen_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Painter};

#[derive(Debug, Serialize)]
struct Reachability {
    source: String,
    reachable: bool,
    devices: usize,
}

pub async fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let source = crate::config::build_source(cfg, global).await?;
    source.check_reachable().await?;
    let devices = source.list_device_ids().await?.len();

    let report = Reachability {
        source: source.describe(),
        reachable: true,
        devices,
    };
    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            format!(
                "{} {} is reachable ({} devices)",
                painter.success("ok"),
                painter.accent(&r.source),
                r.devices
            )
        },
        |r| r.source.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
