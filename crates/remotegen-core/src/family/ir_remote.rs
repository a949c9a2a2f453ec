// Infrared transmitters: fire-and-forget, no state feedback.

use serde_json::Value;

use crate::icons::IconRule;
use crate::model::{FieldType, StateDefinition, StateField};

pub(super) static ICON_OVERRIDES: &[IconRule] = &[
    IconRule::exact("light", "Lightbulb"),
    IconRule::exact("light_toggle", "Lightbulb"),
    IconRule::contains("fan_speed", "Speed"),
    IconRule::contains("timer", "Timer"),
];

/// The only thing worth remembering is what was last sent.
pub(super) fn static_state(interface_name: String) -> StateDefinition {
    StateDefinition {
        interface_name,
        fields: vec![
            StateField {
                name: "last_command".into(),
                field_type: FieldType::Nullable(Box::new(FieldType::Text)),
                optional: false,
                description: "Most recent command transmitted".into(),
                default_value: Some(Value::Null),
            },
            StateField {
                name: "last_sent_at".into(),
                field_type: FieldType::Nullable(Box::new(FieldType::Text)),
                optional: false,
                description: "ISO timestamp of the most recent transmission".into(),
                default_value: Some(Value::Null),
            },
        ],
        imports: Vec::new(),
        extends: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::family::DeviceFamily;
    use crate::family::tests::config;
    use crate::groups;
    use crate::model::{SpecialCase, StateDefinition};

    #[test]
    fn ir_remote_is_stateless_with_light_override() {
        let cfg = config("ir_remote", &["light", "power"]);
        let structure = DeviceFamily::IrRemote
            .analyze_structure(&cfg, &groups::derive_groups(&cfg), StateDefinition::fallback("S"))
            .unwrap();
        assert!(structure.is_stateless());
        assert_eq!(structure.special_cases, vec![SpecialCase::Stateless]);
    }
}
