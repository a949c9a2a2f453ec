//! Generate command handler.

use std::io::IsTerminal;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use remotegen_config::Config;
use remotegen_core::{
    BatchOrchestrator, BatchResult, ComponentValidator, GenerationResult, SourceValidator,
};

use crate::cli::{GenerateArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Page")]
    page: String,
    #[tabled(rename = "Note")]
    note: String,
}

impl From<&GenerationResult> for ResultRow {
    fn from(r: &GenerationResult) -> Self {
        let status = if r.success {
            "generated"
        } else if r.skipped {
            "skipped"
        } else {
            "failed"
        };
        let note = match (&r.error, r.validated) {
            (Some(err), _) => err.clone(),
            (None, Some(false)) => "validation reported errors".into(),
            (None, Some(true)) => "validated".into(),
            (None, None) => String::new(),
        };
        Self {
            device: r.device_id.clone(),
            status: status.into(),
            class: r.device_class.clone().unwrap_or_default(),
            page: r
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            note,
        }
    }
}

fn detail(summary: &BatchResult, painter: Painter) -> String {
    let rows: Vec<ResultRow> = summary.results.iter().map(ResultRow::from).collect();
    let counts = format!(
        "{}/{} generated, {} failed, {} skipped in {:.1}s",
        summary.successful,
        summary.total_processed,
        summary.failed,
        summary.skipped,
        summary.processing_time.as_secs_f64()
    );
    let counts = if summary.failed > 0 {
        painter.error(&counts)
    } else if summary.skipped > 0 {
        painter.warning(&counts)
    } else {
        painter.success(&counts)
    };

    let mut lines = vec![output::render_table(&rows), counts];
    if summary.aborted {
        lines.push(painter.error("Run aborted, remaining devices were not attempted"));
    }
    lines.join("\n")
}

fn generated_files(summary: &BatchResult) -> String {
    summary
        .generated_files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Progress ────────────────────────────────────────────────────────

fn progress_bar(len: usize, global: &GlobalOpts) -> ProgressBar {
    let interactive = matches!(global.output, OutputFormat::Table)
        && !global.quiet
        && std::io::stderr().is_terminal();
    if !interactive {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(len).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: GenerateArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = cfg.clone();
    if let Some(width) = args.concurrency {
        cfg.batch.concurrency = usize::from(width);
    }
    if args.fail_fast {
        cfg.batch.continue_on_error = false;
    }
    if args.docs {
        cfg.output.docs = true;
    }
    if args.no_state_hooks {
        cfg.output.state_hooks = false;
    }

    let source = crate::config::build_source(&cfg, global).await?;
    let device_ids = if args.all {
        source.list_device_ids().await?
    } else {
        args.devices
    };
    if device_ids.is_empty() {
        return Err(CliError::Validation {
            field: "devices".into(),
            reason: format!("{} lists no devices", source.describe()),
        });
    }

    let mut generator = super::generator(&cfg, source);
    if args.validate || cfg.validation.enabled {
        generator = generator
            .with_component_validator(ComponentValidator::new())
            .with_source_validator(SourceValidator::new(cfg.validator_config()));
    }
    if !args.no_manifest {
        generator = generator.with_manifest();
    }
    let generator = Arc::new(generator);

    let bar = progress_bar(device_ids.len(), global);
    let tick = bar.clone();
    let orchestrator = BatchOrchestrator::new(Arc::clone(&generator), cfg.batch_options())
        .with_progress(move |result| {
            tick.set_message(result.device_id.clone());
            tick.inc(1);
        });
    let summary = orchestrator.process_many(&device_ids).await;
    bar.finish_and_clear();

    if args.rebuild_manifest {
        let manifest = generator.rebuild_manifest().await?;
        tracing::info!(devices = manifest.total_devices, "manifest rebuilt");
    }

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &summary,
        |s| detail(s, painter),
        generated_files,
    )?;
    output::print_output(&out, global.quiet);

    // A run that produced nothing is a failure, including a single
    // device that failed or was skipped.
    if summary.successful == 0 {
        return Err(CliError::RunFailed {
            failed: summary.failed,
            skipped: summary.skipped,
        });
    }
    Ok(())
}
