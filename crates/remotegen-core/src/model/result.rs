// ── Generation outcomes ──

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::recovery::HandledError;

/// Outcome of one device's generation within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub device_id: String,
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub device_class: Option<String>,
    pub error: Option<String>,
    pub skipped: bool,
    /// Additional files written for this device (hook, schema, docs).
    #[serde(default)]
    pub extra_files: Vec<PathBuf>,
    /// Outcome of post-generation validation, when it ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<bool>,
}

impl GenerationResult {
    pub fn succeeded(
        device_id: impl Into<String>,
        device_class: impl Into<String>,
        output_path: PathBuf,
        extra_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            success: true,
            output_path: Some(output_path),
            device_class: Some(device_class.into()),
            error: None,
            skipped: false,
            extra_files,
            validated: None,
        }
    }

    pub fn failed(device_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            success: false,
            output_path: None,
            device_class: None,
            error: Some(error.into()),
            skipped: false,
            extra_files: Vec::new(),
            validated: None,
        }
    }

    pub fn skipped(device_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            skipped: true,
            ..Self::failed(device_id, reason)
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.success && !self.skipped
    }
}

/// Aggregate summary of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_rate: f64,
    #[serde(with = "duration_ms")]
    pub processing_time: Duration,
    pub failed_devices: Vec<String>,
    pub generated_files: Vec<PathBuf>,
    /// `true` when an abort directive stopped the run early.
    pub aborted: bool,
    pub results: Vec<GenerationResult>,
    pub handled_errors: Vec<HandledError>,
}

impl BatchResult {
    pub fn from_results(
        results: Vec<GenerationResult>,
        processing_time: Duration,
        aborted: bool,
        handled_errors: Vec<HandledError>,
    ) -> Self {
        let total_processed = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        let failed_devices: Vec<String> = results
            .iter()
            .filter(|r| r.is_failure())
            .map(|r| r.device_id.clone())
            .collect();
        let generated_files = results
            .iter()
            .filter(|r| r.success)
            .flat_map(|r| r.output_path.iter().chain(&r.extra_files).cloned())
            .collect();

        Self {
            total_processed,
            successful,
            failed: failed_devices.len(),
            skipped,
            success_rate: success_rate(successful, total_processed),
            processing_time,
            failed_devices,
            generated_files,
            aborted,
            results,
            handled_errors,
        }
    }
}

/// `successful / total * 100`, defined as 0 for an empty run.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
