// ── Routing manifest records ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Manifest format version embedded in every generated manifest.
pub const MANIFEST_API_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePageEntry {
    pub id: String,
    pub name: String,
    pub device_class: String,
    pub component_name: String,
    pub route: String,
    /// Page path relative to the generation root, `/`-separated.
    pub file_path: String,
    pub generated_at: DateTime<Utc>,
    /// Content hash of the generated page, for change detection only.
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterManifest {
    pub devices: Vec<DevicePageEntry>,
    pub generated_at: DateTime<Utc>,
    pub api_version: String,
    pub total_devices: usize,
    pub device_classes: Vec<String>,
}
