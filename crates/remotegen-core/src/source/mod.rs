// ── Configuration sources ──
//
// Where device command descriptions come from. The pipeline only needs
// four questions answered: what devices exist, what a device's config is,
// what its groups are, and whether the source is reachable at all.

mod local;
mod remote;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{DeviceConfig, DeviceGroups};

pub use local::{DeviceMapping, LocalSource, ScenarioAction, ScenarioDefinition};
pub use remote::RemoteSource;

#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Short human-readable description (path or URL) for logs.
    fn describe(&self) -> String;

    /// Every known device id, sorted.
    async fn list_device_ids(&self) -> Result<Vec<String>, CoreError>;

    /// `CoreError::DeviceNotFound` when the id is unknown.
    async fn fetch_device_config(&self, device_id: &str) -> Result<DeviceConfig, CoreError>;

    async fn fetch_device_groups(&self, device_id: &str) -> Result<DeviceGroups, CoreError>;

    async fn check_reachable(&self) -> Result<(), CoreError>;
}
