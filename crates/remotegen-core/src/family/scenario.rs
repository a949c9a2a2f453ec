// Virtual composite devices. Every action's `location` is the id of the
// device that actually executes it and is carried through untouched.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::CoreError;
use crate::model::{DeviceConfig, FieldType, SpecialCase, StateDefinition, StateField};

pub(super) fn check(config: &DeviceConfig) -> Result<(), CoreError> {
    let missing: Vec<&str> = config
        .commands
        .iter()
        .filter(|(_, c)| c.location.trim().is_empty())
        .map(|(k, _)| k.as_str())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidDeviceConfig {
            device_id: config.device_id.clone(),
            message: format!("scenario actions without a target device: {}", missing.join(", ")),
        })
    }
}

pub(super) fn special_cases(config: &DeviceConfig) -> Vec<SpecialCase> {
    let targets: BTreeSet<&str> = config
        .commands
        .values()
        .map(|c| c.location.as_str())
        .collect();
    vec![SpecialCase::DelegatedActions {
        targets: targets.into_iter().map(str::to_owned).collect(),
    }]
}

pub(super) fn static_state(interface_name: String) -> StateDefinition {
    StateDefinition {
        interface_name,
        fields: vec![
            StateField {
                name: "active".into(),
                field_type: FieldType::Boolean,
                optional: false,
                description: "Whether the scenario is currently running".into(),
                default_value: Some(Value::Bool(false)),
            },
            StateField {
                name: "last_action".into(),
                field_type: FieldType::Nullable(Box::new(FieldType::Text)),
                optional: false,
                description: "Most recent scenario action".into(),
                default_value: Some(Value::Null),
            },
        ],
        imports: Vec::new(),
        extends: None,
    }
}
