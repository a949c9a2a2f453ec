// State hook and shared schema module rendering.

use serde_json::Value;

use super::{Code, HEADER, SOURCE_SCHEMA_PREFIX, TemplateGenerator, ts_key, ts_string};
use crate::error::CoreError;
use crate::model::{FieldType, StateDefinition};
use crate::naming;
use crate::schema::SchemaRef;

impl TemplateGenerator {
    /// Render the `use<Device>State` hook.
    ///
    /// With `shared` set, the interface and defaults are imported from the
    /// shared schema module instead of being declared inline.
    pub fn generate_state_hook(
        &self,
        state: &StateDefinition,
        device_id: &str,
        shared: Option<&SchemaRef>,
    ) -> Result<String, CoreError> {
        let hook = naming::hook_name(device_id)?;
        let interface = &state.interface_name;
        let defaults = naming::defaults_const_name(interface);

        let mut out = Code::default();
        out.line(0, HEADER);
        out.blank();
        out.line(
            0,
            format!(
                "import {{ useDeviceState }} from {};",
                ts_string(&self.hooks_import)
            ),
        );
        match shared {
            Some(schema) => {
                out.line(
                    0,
                    format!(
                        "import {{ {defaults}, type {interface} }} from {};",
                        ts_string(&format!("../schemas/{}", schema.file_stem()))
                    ),
                );
                out.blank();
                out.line(0, format!("export type {{ {interface} }};"));
            }
            None => {
                for import in &state.imports {
                    out.line(0, import);
                }
                out.blank();
                render_interface(&mut out, state);
                out.blank();
                render_defaults(&mut out, state, &defaults);
            }
        }
        out.blank();
        out.line(0, format!("export function {hook}(): {interface} {{"));
        out.line(
            1,
            format!(
                "return useDeviceState<{interface}>({}, {defaults});",
                ts_string(device_id)
            ),
        );
        out.line(0, "}");
        Ok(out.finish())
    }

    /// Render the shared module for an externally owned schema.
    pub fn generate_schema_module(&self, schema: &SchemaRef, state: &StateDefinition) -> String {
        let mut out = Code::default();
        out.line(0, HEADER);
        out.line(0, format!("{SOURCE_SCHEMA_PREFIX}{schema}"));
        for import in &state.imports {
            out.line(0, import);
        }
        out.blank();
        render_interface(&mut out, state);
        out.blank();
        render_defaults(
            &mut out,
            state,
            &naming::defaults_const_name(&state.interface_name),
        );
        out.finish()
    }
}

fn render_interface(out: &mut Code, state: &StateDefinition) {
    let extends = state
        .extends
        .as_deref()
        .map(|base| format!(" extends {base}"))
        .unwrap_or_default();
    out.line(
        0,
        format!("export interface {}{extends} {{", state.interface_name),
    );
    for field in &state.fields {
        if !field.description.is_empty() {
            out.line(1, format!("/** {} */", field.description.replace("*/", "* /")));
        }
        out.line(
            1,
            format!(
                "{}{}: {};",
                ts_key(&field.name),
                if field.optional { "?" } else { "" },
                field.field_type.to_typescript()
            ),
        );
    }
    out.line(0, "}");
}

fn render_defaults(out: &mut Code, state: &StateDefinition, const_name: &str) {
    out.line(
        0,
        format!("export const {const_name}: {} = {{", state.interface_name),
    );
    for field in &state.fields {
        let value = match (&field.default_value, field.optional) {
            (Some(value), _) => value.clone(),
            (None, true) => continue,
            (None, false) => zero_value(&field.field_type),
        };
        out.line(1, format!("{}: {value},", ts_key(&field.name)));
    }
    out.line(0, "};");
}

fn zero_value(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::Text => Value::String(String::new()),
        FieldType::Number => Value::from(0),
        FieldType::Boolean => Value::Bool(false),
        FieldType::List(_) => Value::Array(Vec::new()),
        FieldType::Map(_) => Value::Object(serde_json::Map::new()),
        FieldType::Nullable(_) | FieldType::Any => Value::Null,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::StateField;
    use pretty_assertions::assert_eq;

    fn state() -> StateDefinition {
        StateDefinition {
            interface_name: "KitchenHoodState".into(),
            fields: vec![
                StateField {
                    name: "last_command".into(),
                    field_type: FieldType::Nullable(Box::new(FieldType::Text)),
                    optional: false,
                    description: "Last command sent".into(),
                    default_value: None,
                },
                StateField {
                    name: "fan_speed".into(),
                    field_type: FieldType::Number,
                    optional: true,
                    description: String::new(),
                    default_value: None,
                },
            ],
            imports: Vec::new(),
            extends: None,
        }
    }

    #[test]
    fn inline_hook() {
        let out = TemplateGenerator::default()
            .generate_state_hook(&state(), "kitchen_hood", None)
            .unwrap();
        assert_eq!(
            out,
            r#"// Generated by remotegen. Do not edit by hand.

import { useDeviceState } from "@/state";

export interface KitchenHoodState {
  /** Last command sent */
  last_command: string | null;
  fan_speed?: number;
}

export const KITCHEN_HOOD_STATE_DEFAULTS: KitchenHoodState = {
  last_command: null,
};

export function useKitchenHoodState(): KitchenHoodState {
  return useDeviceState<KitchenHoodState>("kitchen_hood", KITCHEN_HOOD_STATE_DEFAULTS);
}
"#
        );
    }

    #[test]
    fn shared_hook_imports_schema_module() {
        let schema = SchemaRef::parse("backend.state:KitchenHoodState").unwrap();
        let out = TemplateGenerator::default()
            .generate_state_hook(&state(), "hood_two", Some(&schema))
            .unwrap();
        assert!(out.contains(
            r#"import { KITCHEN_HOOD_STATE_DEFAULTS, type KitchenHoodState } from "../schemas/backend_state__KitchenHoodState";"#
        ));
        assert!(out.contains("export function useHoodTwoState(): KitchenHoodState {"));
        assert!(!out.contains("export interface"));
    }

    #[test]
    fn schema_module_names_its_source() {
        let schema = SchemaRef::parse("backend.state:KitchenHoodState").unwrap();
        let out = TemplateGenerator::default().generate_schema_module(&schema, &state());
        assert!(out.contains("// Source schema: backend.state:KitchenHoodState"));
        assert!(out.contains("export const KITCHEN_HOOD_STATE_DEFAULTS: KitchenHoodState = {"));
    }
}
