// ── Router manifest integration ──
//
// The manifest is a TypeScript module embedding a JSON `RouterManifest`
// between marker comments, followed by accessor functions. The embedded
// JSON is the source of truth: incremental runs parse it back, merge the
// new entries by id and rewrite the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::fsutil;
use crate::generator::OutputLayout;
use crate::model::{DevicePageEntry, MANIFEST_API_VERSION, RemoteDeviceStructure, RouterManifest};
use crate::naming;
use crate::template::HEADER;

const BEGIN_MARKER: &str = "/* manifest:begin */";
const END_MARKER: &str = "/* manifest:end */";
const DEVICE_LINE_PREFIX: &str = "// Device: ";

/// Content hash used for change detection.
pub fn checksum(contents: &str) -> String {
    format!("{:08x}", crc32fast::hash(contents.as_bytes()))
}

/// Manifest record for a freshly generated page.
///
/// `file_path` is the page path relative to the generation root and
/// `contents` the exact bytes written there.
pub fn create_entry(
    structure: &RemoteDeviceStructure,
    file_path: &str,
    contents: &str,
    generated_at: DateTime<Utc>,
) -> Result<DevicePageEntry, CoreError> {
    Ok(DevicePageEntry {
        id: structure.device_id.clone(),
        name: structure.device_name.clone(),
        device_class: structure.device_class.clone(),
        component_name: naming::component_name(&structure.device_id)?,
        route: naming::route(&structure.device_id),
        file_path: file_path.to_owned(),
        generated_at,
        checksum: checksum(contents),
    })
}

/// Rebuild an entry from a page already on disk, using the device line
/// the component template writes under the header. `None` for files that
/// were not generated.
pub fn entry_from_page(
    file_path: &str,
    contents: &str,
    generated_at: DateTime<Utc>,
) -> Option<DevicePageEntry> {
    let line = contents
        .lines()
        .take(3)
        .find_map(|l| l.strip_prefix(DEVICE_LINE_PREFIX))?;
    let (head, device_class) = line.rsplit_once("), class ")?;
    let (name, id) = head.rsplit_once(" (")?;
    Some(DevicePageEntry {
        id: id.to_owned(),
        name: name.to_owned(),
        device_class: device_class.trim().to_owned(),
        component_name: naming::component_name(id).ok()?,
        route: naming::route(id),
        file_path: file_path.to_owned(),
        generated_at,
        checksum: checksum(contents),
    })
}

/// Replace-by-id merge. Entries in `incoming` win; every other existing
/// entry is kept. The result is sorted by id.
pub fn merge(existing: Vec<DevicePageEntry>, incoming: Vec<DevicePageEntry>) -> Vec<DevicePageEntry> {
    let mut by_id: BTreeMap<String, DevicePageEntry> = BTreeMap::new();
    for entry in existing.into_iter().chain(incoming) {
        by_id.insert(entry.id.clone(), entry);
    }
    by_id.into_values().collect()
}

/// Assemble a manifest from entries (sorted by id by the caller or `merge`).
pub fn build_manifest(devices: Vec<DevicePageEntry>, generated_at: DateTime<Utc>) -> RouterManifest {
    let mut device_classes: Vec<String> = devices.iter().map(|d| d.device_class.clone()).collect();
    device_classes.sort();
    device_classes.dedup();
    RouterManifest {
        total_devices: devices.len(),
        devices,
        generated_at,
        api_version: MANIFEST_API_VERSION.to_owned(),
        device_classes,
    }
}

/// Rendered manifest module and the checksum of its text.
#[derive(Debug, Clone)]
pub struct RenderedManifest {
    pub text: String,
    pub checksum: String,
}

pub fn render_manifest(manifest: &RouterManifest) -> Result<RenderedManifest, CoreError> {
    let json = serde_json::to_string_pretty(manifest).map_err(|e| CoreError::Template {
        message: format!("cannot serialize manifest: {e}"),
    })?;

    let text = format!(
        r#"{HEADER}

export interface DevicePageEntry {{
  id: string;
  name: string;
  deviceClass: string;
  componentName: string;
  route: string;
  filePath: string;
  generatedAt: string;
  checksum: string;
}}

export interface RouterManifest {{
  devices: DevicePageEntry[];
  generatedAt: string;
  apiVersion: string;
  totalDevices: number;
  deviceClasses: string[];
}}

export const deviceManifest: RouterManifest = {BEGIN_MARKER}
{json}
{END_MARKER};

export function getDeviceEntry(id: string): DevicePageEntry | undefined {{
  return deviceManifest.devices.find((entry) => entry.id === id);
}}

export function getDevicesByClass(deviceClass: string): DevicePageEntry[] {{
  return deviceManifest.devices.filter((entry) => entry.deviceClass === deviceClass);
}}

export function getDeviceRoutes(): string[] {{
  return deviceManifest.devices.map((entry) => entry.route);
}}
"#
    );
    let checksum = checksum(&text);
    Ok(RenderedManifest { text, checksum })
}

/// Recover the embedded manifest from a rendered module.
pub fn parse_manifest(text: &str) -> Result<RouterManifest, CoreError> {
    let malformed = |why: &str| CoreError::Validation {
        message: format!("malformed manifest: {why}"),
    };
    let start = text
        .find(BEGIN_MARKER)
        .ok_or_else(|| malformed("begin marker missing"))?
        + BEGIN_MARKER.len();
    let end = text[start..]
        .find(END_MARKER)
        .ok_or_else(|| malformed("end marker missing"))?
        + start;
    serde_json::from_str(text[start..end].trim()).map_err(|e| malformed(&e.to_string()))
}

// ── On-disk integration ─────────────────────────────────────────────

/// Owns the manifest file of one generation root. Read-merge-write runs
/// under a lock so concurrent devices cannot lose each other's entries.
pub struct ManifestIntegrator {
    path: PathBuf,
    pages: Option<OutputLayout>,
    lock: Mutex<()>,
}

impl ManifestIntegrator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pages: None,
            lock: Mutex::new(()),
        }
    }

    /// Recover existing entries from the pages under `layout` when the
    /// manifest on disk cannot be parsed.
    #[must_use]
    pub fn with_page_recovery(mut self, layout: OutputLayout) -> Self {
        self.pages = Some(layout);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current manifest, or `None` when no manifest has been written yet.
    pub async fn load(&self) -> Result<Option<RouterManifest>, CoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => parse_manifest(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Validation {
                message: format!("cannot read {}: {e}", self.path.display()),
            }),
        }
    }

    /// Merge `entries` into the on-disk manifest and rewrite it.
    pub async fn integrate(
        &self,
        entries: Vec<DevicePageEntry>,
    ) -> Result<RouterManifest, CoreError> {
        let _guard = self.lock.lock().await;
        let existing = match self.load().await {
            Ok(Some(manifest)) => manifest.devices,
            Ok(None) => Vec::new(),
            Err(e) => {
                let Some(layout) = &self.pages else {
                    return Err(e);
                };
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "existing manifest unreadable, recovering entries from generated pages"
                );
                layout.scan_pages().await?
            }
        };
        let before = existing.len();
        let manifest = build_manifest(merge(existing, entries), Utc::now());
        self.write(&manifest).await?;
        debug!(
            path = %self.path.display(),
            before,
            after = manifest.total_devices,
            "manifest updated"
        );
        Ok(manifest)
    }

    /// Replace the manifest wholesale.
    pub async fn rebuild(&self, entries: Vec<DevicePageEntry>) -> Result<RouterManifest, CoreError> {
        let _guard = self.lock.lock().await;
        let manifest = build_manifest(merge(Vec::new(), entries), Utc::now());
        self.write(&manifest).await?;
        info!(path = %self.path.display(), devices = manifest.total_devices, "manifest rebuilt");
        Ok(manifest)
    }

    async fn write(&self, manifest: &RouterManifest) -> Result<(), CoreError> {
        let rendered = render_manifest(manifest)?;
        fsutil::write_atomic(&self.path, &rendered.text).await
    }
}
