//! Manifest command handlers.

use tabled::Tabled;

use remotegen_config::Config;
use remotegen_core::{DevicePageEntry, ManifestIntegrator, OutputLayout, RouterManifest};

use crate::cli::{GlobalOpts, ManifestArgs, ManifestCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Generated")]
    generated: String,
}

impl From<&DevicePageEntry> for EntryRow {
    fn from(e: &DevicePageEntry) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            class: e.device_class.clone(),
            route: e.route.clone(),
            file: e.file_path.clone(),
            generated: e.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn detail(manifest: &RouterManifest, painter: Painter) -> String {
    let rows: Vec<EntryRow> = manifest.devices.iter().map(EntryRow::from).collect();
    format!(
        "{}\n{} devices, classes: {}",
        output::render_table(&rows),
        painter.accent(&manifest.total_devices.to_string()),
        manifest.device_classes.join(", ")
    )
}

fn ids(manifest: &RouterManifest) -> String {
    manifest
        .devices
        .iter()
        .map(|d| d.id.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ManifestArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let layout = OutputLayout::new(&cfg.output.dir);
    let integrator = ManifestIntegrator::new(layout.manifest());
    let painter = Painter::new(&global.color);

    let manifest = match args.command {
        ManifestCommand::Show => integrator.load().await?.ok_or_else(|| CliError::NotFound {
            resource_type: "Manifest".into(),
            identifier: integrator.path().display().to_string(),
            hint: "manifest rebuild".into(),
        })?,
        ManifestCommand::Rebuild => {
            let entries = layout.scan_pages().await?;
            let manifest = integrator.rebuild(entries).await?;
            tracing::info!(
                path = %integrator.path().display(),
                devices = manifest.total_devices,
                "manifest rebuilt"
            );
            manifest
        }
    };

    let out = output::render_single(&global.output, &manifest, |m| detail(m, painter), ids)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
