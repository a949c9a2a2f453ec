// Local configuration source: a JSON mapping file pointing at one config
// file per device, plus scenario descriptions that are resolved into
// synthetic device configs on the fly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ConfigSource;
use crate::error::CoreError;
use crate::groups;
use crate::model::{CommandParameter, DeviceCommand, DeviceConfig, DeviceGroups};

/// Device class assigned to resolved scenarios.
pub const SCENARIO_CLASS: &str = "scenario";

/// Contents of the mapping file. Paths are relative to the mapping file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMapping {
    #[serde(default)]
    pub devices: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub scenarios: BTreeMap<String, PathBuf>,
}

/// A virtual device composed of actions on other devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub scenario_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<ScenarioAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    pub name: String,
    /// Device that executes the action.
    pub target_device: String,
    /// Command on the target; defaults to `name`.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<CommandParameter>>,
}

impl ScenarioDefinition {
    /// Synthesize the scenario's device config. Each action's `location`
    /// is the target device id, unchanged.
    pub fn to_device_config(&self) -> DeviceConfig {
        let commands = self
            .actions
            .iter()
            .map(|a| {
                (
                    a.name.clone(),
                    DeviceCommand {
                        action: a.command.clone().unwrap_or_else(|| a.name.clone()),
                        location: a.target_device.clone(),
                        description: a.description.clone(),
                        group: a.group.clone(),
                        params: a.params.clone(),
                    },
                )
            })
            .collect();
        DeviceConfig {
            device_id: self.scenario_id.clone(),
            device_name: self.name.clone(),
            device_class: SCENARIO_CLASS.into(),
            commands,
            state_schema: None,
        }
    }
}

/// Reads device configs from disk.
pub struct LocalSource {
    mapping_path: PathBuf,
    base_dir: PathBuf,
    mapping: DeviceMapping,
}

impl LocalSource {
    /// Load the mapping file.
    pub async fn open(mapping_path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let mapping_path = mapping_path.into();
        let mapping: DeviceMapping = read_json(&mapping_path, "mapping").await?;
        let base_dir = mapping_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        debug!(
            path = %mapping_path.display(),
            devices = mapping.devices.len(),
            scenarios = mapping.scenarios.len(),
            "loaded device mapping"
        );
        Ok(Self {
            mapping_path,
            base_dir,
            mapping,
        })
    }

    pub fn mapping(&self) -> &DeviceMapping {
        &self.mapping
    }

    async fn load_scenario(&self, scenario_id: &str, path: &Path) -> Result<DeviceConfig, CoreError> {
        let scenario: ScenarioDefinition = read_json(&self.base_dir.join(path), scenario_id).await?;
        if scenario.scenario_id != scenario_id {
            warn!(
                mapped = %scenario_id,
                declared = %scenario.scenario_id,
                "scenario id differs from mapping key, using mapping key"
            );
        }
        let mut config = scenario.to_device_config();
        config.device_id = scenario_id.to_owned();
        Ok(config)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T, CoreError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::InvalidDeviceConfig {
                device_id: what.to_owned(),
                message: format!("{} not found", path.display()),
            }
        } else {
            CoreError::Internal(format!("cannot read {}: {e}", path.display()))
        }
    })?;
    serde_json::from_str(&text).map_err(|e| CoreError::InvalidDeviceConfig {
        device_id: what.to_owned(),
        message: format!("{}: {e}", path.display()),
    })
}

#[async_trait]
impl ConfigSource for LocalSource {
    fn describe(&self) -> String {
        self.mapping_path.display().to_string()
    }

    async fn list_device_ids(&self) -> Result<Vec<String>, CoreError> {
        let mut ids: Vec<String> = self
            .mapping
            .devices
            .keys()
            .chain(self.mapping.scenarios.keys())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn fetch_device_config(&self, device_id: &str) -> Result<DeviceConfig, CoreError> {
        if let Some(path) = self.mapping.devices.get(device_id) {
            let mut config: DeviceConfig = read_json(&self.base_dir.join(path), device_id).await?;
            if config.device_id != device_id {
                warn!(
                    mapped = %device_id,
                    declared = %config.device_id,
                    "device id differs from mapping key, using mapping key"
                );
                device_id.clone_into(&mut config.device_id);
            }
            return Ok(config);
        }
        if let Some(path) = self.mapping.scenarios.get(device_id) {
            return self.load_scenario(device_id, path).await;
        }
        Err(CoreError::DeviceNotFound {
            device_id: device_id.to_owned(),
        })
    }

    async fn fetch_device_groups(&self, device_id: &str) -> Result<DeviceGroups, CoreError> {
        let config = self.fetch_device_config(device_id).await?;
        Ok(groups::derive_groups(&config))
    }

    async fn check_reachable(&self) -> Result<(), CoreError> {
        tokio::fs::metadata(&self.mapping_path)
            .await
            .map(|_| ())
            .map_err(|e| CoreError::ConnectionFailed {
                source_name: self.describe(),
                reason: e.to_string(),
            })
    }
}
