// ── Device command description ──
//
// The declarative input of the pipeline: what a device can be told to do.
// Loaded from local config files or the configuration service and never
// mutated once a generation run has started.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Group assigned to commands without an explicit (or declared) group.
pub const DEFAULT_GROUP: &str = "default";

/// Value type of a command parameter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ParameterType {
    Range,
    String,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
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

/// A single command a device exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub action: String,
    /// Where the command executes. For physical devices this names the
    /// hardware location; for scenarios it is the id of the delegate device.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<CommandParameter>>,
}

impl DeviceCommand {
    pub fn parameters(&self) -> &[CommandParameter] {
        self.params.as_deref().unwrap_or_default()
    }

    /// First parameter of type `range`, if any.
    pub fn range_parameter(&self) -> Option<&CommandParameter> {
        self.parameters()
            .iter()
            .find(|p| p.param_type == ParameterType::Range)
    }

    /// The explicit group, or `None` for ungrouped commands.
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.trim().is_empty())
    }
}

/// Complete command description of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device_id: String,
    pub device_name: String,
    /// Family tag used to pick the generation strategy.
    pub device_class: String,
    #[serde(default)]
    pub commands: BTreeMap<String, DeviceCommand>,
    /// Optional `module:Type` reference to an externally owned state schema.
    #[serde(default)]
    pub state_schema: Option<String>,
}

impl DeviceConfig {
    pub fn command(&self, key: &str) -> Option<&DeviceCommand> {
        self.commands.get(key)
    }
}
