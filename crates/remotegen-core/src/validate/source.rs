// Compiler-backed validation: each generated file is compiled in
// isolation and the diagnostic stream is filtered down to problems that
// originate in the generated set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ValidationIssue, ValidationReport, source_files};
use crate::config::ValidatorConfig;
use crate::error::CoreError;

/// `file(line,col): error TS1234: message`
fn diagnostic_regex() -> Option<&'static Regex> {
    static DIAGNOSTIC: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(r"^(.+?)\((\d+),(\d+)\): (error|warning) (TS\d+): (.*)$").ok()
    });
    DIAGNOSTIC.as_ref()
}

fn missing_name_regex() -> Option<&'static Regex> {
    static MISSING: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"Cannot find name '([^']+)'").ok());
    MISSING.as_ref()
}

/// Node/DOM typings missing in an isolated compile.
const ENVIRONMENT_CODES: &[&str] = &["TS2580", "TS2591", "TS2584"];

/// Missing external packages or JSX typings: reported, but not failures.
const DEPENDENCY_CODES: &[&str] = &["TS2307", "TS7016", "TS7026", "TS2875"];

#[derive(Debug, PartialEq, Eq)]
struct Diagnostic {
    file: PathBuf,
    line: u32,
    column: u32,
    severity: String,
    code: String,
    message: String,
}

fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    let Some(re) = diagnostic_regex() else {
        return Vec::new();
    };
    output
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim_end())?;
            Some(Diagnostic {
                file: PathBuf::from(&caps[1]),
                line: caps[2].parse().ok()?,
                column: caps[3].parse().ok()?,
                severity: caps[4].to_owned(),
                code: caps[5].to_owned(),
                message: caps[6].to_owned(),
            })
        })
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub struct SourceValidator {
    config: ValidatorConfig,
}

impl SourceValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Compile every generated source under `path` (file or directory).
    pub async fn validate(&self, path: &Path) -> Result<ValidationReport, CoreError> {
        let files = source_files(path)?;
        let generated: HashSet<PathBuf> = files.iter().map(|f| absolute(f)).collect();

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for file in &files {
            let output = self.compile(file).await?;
            self.triage(&output, &generated, &mut errors, &mut warnings);
        }

        info!(
            files = files.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "source validation finished"
        );
        Ok(ValidationReport::from_issues(files.len(), errors, warnings))
    }

    /// Run the compiler on one file and return its combined output.
    async fn compile(&self, file: &Path) -> Result<String, CoreError> {
        debug!(compiler = %self.config.compiler, file = %file.display(), "compiling");
        let run = Command::new(&self.config.compiler)
            .args(&self.config.args)
            .arg(file)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.config.timeout, run)
            .await
            .map_err(|_| CoreError::Validation {
                message: format!(
                    "compiler timed out after {}s on {}",
                    self.config.timeout.as_secs(),
                    file.display()
                ),
            })?
            .map_err(|e| CoreError::Validation {
                message: format!("cannot run {}: {e}", self.config.compiler),
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    fn is_environment_noise(&self, diagnostic: &Diagnostic) -> bool {
        if ENVIRONMENT_CODES.contains(&diagnostic.code.as_str()) {
            return true;
        }
        missing_name_regex()
            .and_then(|re| re.captures(&diagnostic.message))
            .is_some_and(|caps| self.config.ignored_globals.iter().any(|g| *g == caps[1]))
    }

    fn triage(
        &self,
        output: &str,
        generated: &HashSet<PathBuf>,
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) {
        for diagnostic in parse_diagnostics(output) {
            if !generated.contains(&absolute(&diagnostic.file)) {
                debug!(file = %diagnostic.file.display(), code = %diagnostic.code, "ignoring diagnostic outside generated set");
                continue;
            }
            if self.is_environment_noise(&diagnostic) {
                debug!(code = %diagnostic.code, message = %diagnostic.message, "ignoring environment diagnostic");
                continue;
            }
            let downgrade = diagnostic.severity == "warning"
                || DEPENDENCY_CODES.contains(&diagnostic.code.as_str());
            let issue = ValidationIssue {
                file: diagnostic.file,
                line: Some(diagnostic.line),
                column: Some(diagnostic.column),
                code: Some(diagnostic.code),
                message: diagnostic.message,
            };
            if downgrade {
                warnings.push(issue);
            } else {
                errors.push(issue);
            }
        }
    }
}
