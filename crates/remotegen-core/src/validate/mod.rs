// ── Post-generation validation ──
//
// Advisory checks over generated sources. Neither validator rolls back a
// written file; callers log and report the outcome.

mod component;
mod source;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::CoreError;

pub use component::ComponentValidator;
pub use source::SourceValidator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub file: PathBuf,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, "({line},{column})")?;
        }
        write!(f, ": ")?;
        if let Some(code) = &self.code {
            write!(f, "{code} ")?;
        }
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub success: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub files_checked: usize,
}

impl ValidationReport {
    fn from_issues(
        files_checked: usize,
        errors: Vec<ValidationIssue>,
        warnings: Vec<ValidationIssue>,
    ) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
            warnings,
            files_checked,
        }
    }

    /// Combine two reports over the same file set.
    pub fn merge(mut self, other: Self) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.files_checked = self.files_checked.max(other.files_checked);
        self.success = self.errors.is_empty();
        self
    }
}

/// Generated sources under `path` (a file or a directory), sorted.
pub(crate) fn source_files(path: &Path) -> Result<Vec<PathBuf>, CoreError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(CoreError::Validation {
            message: format!("{} does not exist", path.display()),
        });
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| is_source(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_source(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    !name.starts_with('.')
        && !name.ends_with(".d.ts")
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "ts" | "tsx"))
}
