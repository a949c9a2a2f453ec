// ── API-to-domain type conversions ──
//
// Bridges raw `remotegen_api` response types into canonical
// `remotegen_core::model` types. Parameter types arrive as free-form
// strings; unknown ones degrade to `string` (rendered as a trigger).

use std::str::FromStr;

use remotegen_api::types::{
    CommandResponse, DeviceConfigResponse, DeviceGroupsResponse, GroupActionResponse,
    GroupResponse, ParameterResponse,
};
use tracing::debug;

use crate::model::{
    CommandParameter, DeviceCommand, DeviceConfig, DeviceGroup, DeviceGroups, GroupAction,
    ParameterType,
};

impl From<ParameterResponse> for CommandParameter {
    fn from(p: ParameterResponse) -> Self {
        let param_type = ParameterType::from_str(&p.param_type).unwrap_or_else(|_| {
            debug!(parameter = %p.name, raw = %p.param_type, "unknown parameter type, using string");
            ParameterType::String
        });
        Self {
            name: p.name,
            param_type,
            required: p.required,
            default: p.default,
            min: p.min,
            max: p.max,
            description: p.description,
        }
    }
}

fn params(raw: Option<Vec<ParameterResponse>>) -> Option<Vec<CommandParameter>> {
    raw.map(|ps| ps.into_iter().map(CommandParameter::from).collect())
}

impl From<CommandResponse> for DeviceCommand {
    fn from(c: CommandResponse) -> Self {
        Self {
            action: c.action,
            location: c.location,
            description: c.description,
            group: c.group,
            params: params(c.params),
        }
    }
}

impl From<DeviceConfigResponse> for DeviceConfig {
    fn from(r: DeviceConfigResponse) -> Self {
        Self {
            device_id: r.device_id,
            device_name: r.device_name,
            device_class: r.device_class,
            commands: r
                .commands
                .into_iter()
                .map(|(key, command)| (key, command.into()))
                .collect(),
            state_schema: r.state_schema,
        }
    }
}

impl From<GroupActionResponse> for GroupAction {
    fn from(a: GroupActionResponse) -> Self {
        Self {
            name: a.name,
            description: a.description,
            params: params(a.params).unwrap_or_default(),
        }
    }
}

impl From<GroupResponse> for DeviceGroup {
    fn from(g: GroupResponse) -> Self {
        Self {
            group_id: g.group_id,
            group_name: g.group_name,
            actions: g.actions.into_iter().map(GroupAction::from).collect(),
            status: g.status,
        }
    }
}

impl From<DeviceGroupsResponse> for DeviceGroups {
    fn from(r: DeviceGroupsResponse) -> Self {
        Self {
            device_id: r.device_id,
            groups: r.groups.into_iter().map(DeviceGroup::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parameter_types_parse_case_insensitively() {
        let raw: ParameterResponse =
            serde_json::from_str(r#"{"name": "level", "type": "Range", "min": 0, "max": 50}"#)
                .unwrap();
        let p = CommandParameter::from(raw);
        assert_eq!(p.param_type, ParameterType::Range);
        assert_eq!(p.max, Some(50.0));
    }

    #[test]
    fn unknown_parameter_type_degrades_to_string() {
        let raw: ParameterResponse =
            serde_json::from_str(r#"{"name": "mode", "type": "enum"}"#).unwrap();
        assert_eq!(CommandParameter::from(raw).param_type, ParameterType::String);
    }

    #[test]
    fn config_response_converts() {
        let raw: DeviceConfigResponse = serde_json::from_str(
            r#"{"device_id": "tv", "device_name": "TV", "device_class": "lg_tv",
                "commands": {"mute": {"action": "mute", "location": "den", "group": "volume"}}}"#,
        )
        .unwrap();
        let config = DeviceConfig::from(raw);
        assert_eq!(config.command("mute").unwrap().group.as_deref(), Some("volume"));
        assert!(config.state_schema.is_none());
    }
}
