//! Validate command handler.

use remotegen_config::Config;
use remotegen_core::validate::ValidationIssue;
use remotegen_core::{ComponentValidator, SourceValidator, ValidationReport};

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

fn detail(report: &ValidationReport, painter: Painter) -> String {
    let mut lines: Vec<String> = report
        .errors
        .iter()
        .map(|i| format!("{} {i}", painter.error("error:")))
        .chain(
            report
                .warnings
                .iter()
                .map(|i| format!("{} {i}", painter.warning("warning:"))),
        )
        .collect();
    let status = if report.success {
        painter.success("ok")
    } else {
        painter.error("failed")
    };
    lines.push(format!(
        "{status}: {} file(s) checked, {} error(s), {} warning(s)",
        report.files_checked,
        report.errors.len(),
        report.warnings.len()
    ));
    lines.join("\n")
}

fn issue_lines(report: &ValidationReport) -> String {
    report
        .errors
        .iter()
        .map(ValidationIssue::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn handle(args: ValidateArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let path = args.path.unwrap_or_else(|| cfg.output.dir.clone());

    let mut report = ComponentValidator::new().validate(&path).await?;
    if !args.structure_only {
        let compiled = SourceValidator::new(cfg.validator_config())
            .validate(&path)
            .await?;
        report = report.merge(compiled);
    }

    let painter = Painter::new(&global.color);
    let out = output::render_single(&global.output, &report, |r| detail(r, painter), issue_lines)?;
    output::print_output(&out, global.quiet);

    if report.success {
        Ok(())
    } else {
        Err(CliError::ValidationFailed {
            errors: report.errors.len(),
            files: report.files_checked,
        })
    }
}
