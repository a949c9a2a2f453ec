// ── Device structure: the generation unit ──

use serde::{Deserialize, Serialize};

use super::zone::{RemoteZone, ZoneId};

/// Closed type vocabulary for generated state fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    List(Box<FieldType>),
    Map(Box<FieldType>),
    Nullable(Box<FieldType>),
    /// Placeholder for external types with no mapping.
    Any,
}

impl FieldType {
    /// TypeScript spelling of the type.
    pub fn to_typescript(&self) -> String {
        match self {
            Self::Text => "string".into(),
            Self::Number => "number".into(),
            Self::Boolean => "boolean".into(),
            Self::List(inner) => match inner.as_ref() {
                Self::Nullable(_) => format!("Array<{}>", inner.to_typescript()),
                _ => format!("{}[]", inner.to_typescript()),
            },
            Self::Map(value) => format!("Record<string, {}>", value.to_typescript()),
            Self::Nullable(inner) => format!("{} | null", inner.to_typescript()),
            Self::Any => "any".into(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub optional: bool,
    pub description: String,
    pub default_value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDefinition {
    pub interface_name: String,
    pub fields: Vec<StateField>,
    pub imports: Vec<String>,
    pub extends: Option<String>,
}

impl StateDefinition {
    /// Minimal definition used when no richer shape is available: a single
    /// `status` text field.
    pub fn fallback(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            fields: vec![StateField {
                name: "status".into(),
                field_type: FieldType::Text,
                optional: false,
                description: "Last reported device status".into(),
                default_value: Some(serde_json::Value::String("unknown".into())),
            }],
            imports: Vec::new(),
            extends: None,
        }
    }
}

/// Family-specific quirks the template generator must honor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SpecialCase {
    /// The power zone drives several independent power domains.
    PowerDomains { domains: Vec<String> },
    /// Actions execute on other devices; locations are device ids.
    DelegatedActions { targets: Vec<String> },
    /// The device cannot report state back (one-way transmitter).
    Stateless,
}

/// Binding from a rendered action to where it is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionHandler {
    pub action_name: String,
    pub location: String,
    pub zone: ZoneId,
    pub takes_parameters: bool,
}

/// Everything the template generator needs for one device.
///
/// Built fresh per generation run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDeviceStructure {
    pub device_id: String,
    pub device_name: String,
    pub device_class: String,
    pub remote_zones: Vec<RemoteZone>,
    pub state_interface: StateDefinition,
    pub action_handlers: Vec<ActionHandler>,
    pub special_cases: Vec<SpecialCase>,
}

impl RemoteDeviceStructure {
    pub fn zone(&self, id: ZoneId) -> Option<&RemoteZone> {
        self.remote_zones.iter().find(|z| z.zone_id == id)
    }

    pub fn power_domains(&self) -> Option<&[String]> {
        self.special_cases.iter().find_map(|c| match c {
            SpecialCase::PowerDomains { domains } => Some(domains.as_slice()),
            _ => None,
        })
    }

    pub fn is_delegating(&self) -> bool {
        self.special_cases
            .iter()
            .any(|c| matches!(c, SpecialCase::DelegatedActions { .. }))
    }

    pub fn is_stateless(&self) -> bool {
        self.special_cases.contains(&SpecialCase::Stateless)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typescript_spelling() {
        let t = FieldType::Nullable(Box::new(FieldType::List(Box::new(FieldType::Text))));
        assert_eq!(t.to_typescript(), "string[] | null");

        let t = FieldType::List(Box::new(FieldType::Nullable(Box::new(FieldType::Number))));
        assert_eq!(t.to_typescript(), "Array<number | null>");

        let t = FieldType::Map(Box::new(FieldType::Any));
        assert_eq!(t.to_typescript(), "Record<string, any>");
    }

    #[test]
    fn fallback_has_one_status_field() {
        let def = StateDefinition::fallback("TvState");
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].name, "status");
        assert_eq!(def.fields[0].field_type, FieldType::Text);
    }
}
