// Structural checks that need no compiler: the file exports a component,
// its relative imports resolve on disk, and every capitalized JSX tag is
// bound by an import or a local declaration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use super::{ValidationIssue, ValidationReport, source_files};
use crate::error::CoreError;

const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

struct Patterns {
    export: Regex,
    import: Regex,
    local: Regex,
    jsx_tag: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: LazyLock<Option<Patterns>> = LazyLock::new(|| {
        Some(Patterns {
            export: Regex::new(
                r"(?m)^export\s+(?:default\s+)?(?:(?:async\s+)?function|const|class)\s+([A-Z]\w*)|^export\s+default\s+([A-Z]\w*)\s*;",
            )
            .ok()?,
            import: Regex::new(r#"(?m)^import\s+(?:type\s+)?(?:(.+?)\s+from\s+)?["']([^"']+)["'];?"#)
                .ok()?,
            local: Regex::new(r"(?m)^(?:export\s+)?(?:default\s+)?(?:function|const|let|class)\s+([A-Z]\w*)")
                .ok()?,
            jsx_tag: Regex::new(r"<([A-Z][A-Za-z0-9_]*)[\s/>.]").ok()?,
        })
    });
    PATTERNS.as_ref()
}

/// Names bound by an import clause: `A`, `{ B, C as D, type E }`, `* as F`.
fn imported_names(clause: &str) -> Vec<String> {
    let mut names = Vec::new();
    let (default_part, braced) = match clause.split_once('{') {
        Some((before, rest)) => (before, rest.split_once('}').map(|(inner, _)| inner)),
        None => (clause, None),
    };
    for part in default_part.split(',') {
        let part = part.trim();
        if let Some(ns) = part.strip_prefix("* as ") {
            names.push(ns.trim().to_owned());
        } else if !part.is_empty() {
            names.push(part.to_owned());
        }
    }
    for spec in braced.unwrap_or_default().split(',') {
        let spec = spec.trim().trim_start_matches("type ").trim();
        if spec.is_empty() {
            continue;
        }
        let local = spec.rsplit_once(" as ").map_or(spec, |(_, alias)| alias);
        names.push(local.trim().to_owned());
    }
    names
}

#[derive(Debug, Default)]
pub struct ComponentValidator;

impl ComponentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check every component (`.tsx`) under `path`.
    pub async fn validate(&self, path: &Path) -> Result<ValidationReport, CoreError> {
        let files: Vec<PathBuf> = source_files(path)?
            .into_iter()
            .filter(|f| f.extension().is_some_and(|e| e == "tsx"))
            .collect();

        let mut errors = Vec::new();
        for file in &files {
            let text = tokio::fs::read_to_string(file)
                .await
                .map_err(|e| CoreError::Validation {
                    message: format!("cannot read {}: {e}", file.display()),
                })?;
            errors.extend(check_source(file, &text).await);
        }

        info!(files = files.len(), errors = errors.len(), "component validation finished");
        Ok(ValidationReport::from_issues(files.len(), errors, Vec::new()))
    }
}

async fn check_source(file: &Path, text: &str) -> Vec<ValidationIssue> {
    let Some(p) = patterns() else {
        return Vec::new();
    };
    let issue = |message: String| ValidationIssue {
        file: file.to_path_buf(),
        line: None,
        column: None,
        code: None,
        message,
    };
    let mut issues = Vec::new();

    if !p.export.is_match(text) {
        issues.push(issue("no exported component found".into()));
    }

    let mut bound: BTreeSet<String> = p
        .local
        .captures_iter(text)
        .map(|c| c[1].to_owned())
        .collect();
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    for caps in p.import.captures_iter(text) {
        if let Some(clause) = caps.get(1) {
            bound.extend(imported_names(clause.as_str()));
        }
        let specifier = &caps[2];
        if (specifier.starts_with("./") || specifier.starts_with("../"))
            && !resolves(&dir.join(specifier)).await
        {
            issues.push(issue(format!("unresolved import {specifier:?}")));
        }
    }

    let tags: BTreeSet<&str> = p
        .jsx_tag
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    for tag in tags {
        if !bound.contains(tag) {
            issues.push(issue(format!("JSX tag <{tag}> is neither imported nor declared")));
        }
    }
    issues
}

/// Whether an import target exists, trying the usual extensions and
/// directory index files.
async fn resolves(target: &Path) -> bool {
    let mut candidates = vec![target.to_path_buf()];
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for ext in RESOLVE_EXTENSIONS {
        candidates.push(target.with_file_name(format!("{file_name}.{ext}")));
        candidates.push(target.join(format!("index.{ext}")));
    }
    for candidate in candidates {
        if tokio::fs::metadata(&candidate)
            .await
            .is_ok_and(|m| m.is_file())
        {
            return true;
        }
    }
    false
}
