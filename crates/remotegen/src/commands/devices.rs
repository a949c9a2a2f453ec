//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use remotegen_config::Config;
use remotegen_core::{DeviceConfig, DeviceFamily, FamilyRegistry, docs};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Listing ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DeviceListing {
    id: String,
    name: String,
    device_class: String,
    /// Canonical family tag, `None` when the class is unsupported.
    family: Option<&'static str>,
    commands: usize,
    state_schema: Option<String>,
}

impl DeviceListing {
    fn new(config: DeviceConfig, registry: &FamilyRegistry) -> Self {
        Self {
            family: registry.resolve(&config.device_class).ok().map(DeviceFamily::tag),
            commands: config.commands.len(),
            id: config.device_id,
            name: config.device_name,
            device_class: config.device_class,
            state_schema: config.state_schema,
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Commands")]
    commands: usize,
}

impl From<&DeviceListing> for DeviceRow {
    fn from(d: &DeviceListing) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            class: d.device_class.clone(),
            family: d.family.unwrap_or("unsupported").into(),
            commands: d.commands,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let source = crate::config::build_source(cfg, global).await?;

    match args.command {
        DevicesCommand::List => {
            let registry = FamilyRegistry::builtin();
            let mut listings = Vec::new();
            for id in source.list_device_ids().await? {
                let config = source.fetch_device_config(&id).await?;
                listings.push(DeviceListing::new(config, &registry));
            }
            let out = output::render_list(
                &global.output,
                &listings,
                |d| DeviceRow::from(d),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Show { device_id } => {
            let structure = super::generator(cfg, source).analyze(&device_id).await?;
            let doc = docs::render_device_doc(&structure)?;
            let out = output::render_single(
                &global.output,
                &structure,
                |_| doc.trim_end().to_owned(),
                |s| s.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
