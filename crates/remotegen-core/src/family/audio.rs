// Multi-zone AV processors: a main zone plus independently powered zone 2.

use serde_json::Value;

use crate::classify::MAIN_POWER_DOMAIN;
use crate::icons::IconRule;
use crate::model::{DeviceConfig, FieldType, ProcessedAction, SpecialCase, StateDefinition, StateField};

pub(super) const ZONE2_DOMAIN: &str = "zone2";

pub(super) static ICON_OVERRIDES: &[IconRule] = &[
    IconRule::contains("zone2", "SpeakerGroup"),
    IconRule::contains("surround", "SurroundSound"),
    IconRule::contains("dim", "BrightnessMedium"),
];

fn is_zone2(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with("zone2") || name.starts_with("zone_2")
}

pub(super) fn power_domain(action: &ProcessedAction) -> String {
    if is_zone2(&action.action_name) {
        ZONE2_DOMAIN.to_owned()
    } else {
        MAIN_POWER_DOMAIN.to_owned()
    }
}

/// Two power domains when the device exposes zone 2 commands.
pub(super) fn special_cases(config: &DeviceConfig) -> Vec<SpecialCase> {
    if config.commands.keys().any(|k| is_zone2(k)) {
        vec![SpecialCase::PowerDomains {
            domains: vec![MAIN_POWER_DOMAIN.to_owned(), ZONE2_DOMAIN.to_owned()],
        }]
    } else {
        Vec::new()
    }
}

fn field(name: &str, field_type: FieldType, default: Value) -> StateField {
    StateField {
        name: name.into(),
        field_type,
        optional: false,
        description: String::new(),
        default_value: Some(default),
    }
}

pub(super) fn static_state(interface_name: String) -> StateDefinition {
    StateDefinition {
        interface_name,
        fields: vec![
            field("power", FieldType::Text, Value::from("off")),
            field("zone2_power", FieldType::Text, Value::from("off")),
            field("volume", FieldType::Number, Value::from(0)),
            field("zone2_volume", FieldType::Number, Value::from(0)),
            field("mute", FieldType::Boolean, Value::Bool(false)),
            field(
                "input_source",
                FieldType::Nullable(Box::new(FieldType::Text)),
                Value::Null,
            ),
        ],
        imports: Vec::new(),
        extends: None,
    }
}
