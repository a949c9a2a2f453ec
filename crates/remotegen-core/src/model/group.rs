// ── Command group metadata ──

use serde::{Deserialize, Serialize};

use super::command::CommandParameter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<CommandParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub group_id: String,
    pub group_name: String,
    #[serde(default)]
    pub actions: Vec<GroupAction>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroups {
    pub device_id: String,
    #[serde(default)]
    pub groups: Vec<DeviceGroup>,
}

impl DeviceGroups {
    pub fn get(&self, group_id: &str) -> Option<&DeviceGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.get(group_id).is_some()
    }
}
