// Networked displays (smart TVs, monitors with a control API).

use serde_json::Value;

use crate::icons::IconRule;
use crate::model::{FieldType, StateDefinition, StateField};

pub(super) static ICON_OVERRIDES: &[IconRule] = &[
    IconRule::exact("home", "Home"),
    IconRule::exact("input", "Tv"),
    IconRule::contains("channel_up", "KeyboardArrowUp"),
    IconRule::contains("channel_down", "KeyboardArrowDown"),
];

fn field(name: &str, field_type: FieldType, default: Value, description: &str) -> StateField {
    StateField {
        name: name.into(),
        field_type,
        optional: false,
        description: description.into(),
        default_value: Some(default),
    }
}

/// Shape used when the display has no schema reference.
pub(super) fn static_state(interface_name: String) -> StateDefinition {
    StateDefinition {
        interface_name,
        fields: vec![
            field("power", FieldType::Text, Value::from("off"), "Power state"),
            field("volume", FieldType::Number, Value::from(0), "Volume level"),
            field("mute", FieldType::Boolean, Value::Bool(false), "Mute state"),
            field(
                "input_source",
                FieldType::Nullable(Box::new(FieldType::Text)),
                Value::Null,
                "Active input",
            ),
            field(
                "connected",
                FieldType::Boolean,
                Value::Bool(false),
                "Whether the display answers on the network",
            ),
        ],
        imports: Vec::new(),
        extends: None,
    }
}
