// Wire types for the configuration service.
//
// These mirror the service's JSON payloads one-to-one. `remotegen-core`
// converts them into its canonical domain model; nothing outside the
// conversion layer should depend on these shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of `GET /api/v1/devices`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSummaryResponse {
    pub device_id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
}

/// `GET /api/v1/devices/{id}/config`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfigResponse {
    pub device_id: String,
    pub device_name: String,
    pub device_class: String,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandResponse>,
    /// Optional `module:Type` reference to the backend state schema.
    #[serde(default)]
    pub state_schema: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandResponse {
    pub action: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<ParameterResponse>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParameterResponse {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub description: String,
}

/// `GET /api/v1/devices/{id}/groups`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceGroupsResponse {
    pub device_id: String,
    #[serde(default)]
    pub groups: Vec<GroupResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupResponse {
    pub group_id: String,
    pub group_name: String,
    #[serde(default)]
    pub actions: Vec<GroupActionResponse>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupActionResponse {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Option<Vec<ParameterResponse>>,
}

/// `GET /api/v1/health`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "up")
    }
}
