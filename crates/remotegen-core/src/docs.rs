// ── Device documentation ──
//
// Markdown summary of a device page: zones, controls, parameters, state
// shape, and the icon choices that still need a human look.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::CoreError;
use crate::model::{ControlKind, RemoteDeviceStructure, SpecialCase, ZoneControl};
use crate::naming;

/// Render the documentation page for one device.
pub fn render_device_doc(structure: &RemoteDeviceStructure) -> Result<String, CoreError> {
    let mut out = String::new();
    render(&mut out, structure)?;
    Ok(out)
}

fn render(out: &mut String, s: &RemoteDeviceStructure) -> Result<(), CoreError> {
    let component = naming::component_name(&s.device_id)?;
    let locations: BTreeMap<&str, &str> = s
        .action_handlers
        .iter()
        .map(|h| (h.action_name.as_str(), h.location.as_str()))
        .collect();

    w(out, format_args!("# {}\n\n", s.device_name));
    w(out, format_args!("- Device ID: `{}`\n", s.device_id));
    w(out, format_args!("- Class: `{}`\n", s.device_class));
    w(out, format_args!("- Route: `{}`\n", naming::route(&s.device_id)));
    w(out, format_args!("- Component: `{component}`\n"));
    for case in &s.special_cases {
        match case {
            SpecialCase::PowerDomains { domains } => {
                w(out, format_args!("- Power domains: {}\n", code_list(domains)));
            }
            SpecialCase::DelegatedActions { targets } => {
                w(out, format_args!("- Delegates to: {}\n", code_list(targets)));
            }
            SpecialCase::Stateless => out.push_str("- Stateless: commands are fire-and-forget\n"),
        }
    }

    out.push_str("\n## Zones\n");
    let mut review: Vec<&ZoneControl> = Vec::new();
    for zone in &s.remote_zones {
        w(out, format_args!("\n### {} ({})\n\n", zone.zone_name, zone.layout));
        let controls = zone.content.controls();
        if controls.is_empty() {
            out.push_str("No actions.\n");
            continue;
        }
        out.push_str("| Action | Label | Control | Icon | Location | Parameters |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for control in controls {
            let kind = match control.control {
                ControlKind::Button => "button",
                ControlKind::Slider => "slider",
            };
            w(
                out,
                format_args!(
                    "| `{}` | {} | {kind} | {} | {} | {} |\n",
                    control.action_name,
                    control.display_name,
                    control.icon_name,
                    locations.get(control.action_name.as_str()).copied().unwrap_or("-"),
                    parameters(control),
                ),
            );
            if control.is_low_confidence() {
                review.push(control);
            }
        }
    }

    let state = &s.state_interface;
    w(out, format_args!("\n## State (`{}`)\n\n", state.interface_name));
    out.push_str("| Field | Type | Default | Description |\n");
    out.push_str("|---|---|---|---|\n");
    for field in &state.fields {
        let optional = if field.optional { "?" } else { "" };
        let default = field
            .default_value
            .as_ref()
            .map_or_else(|| "-".to_owned(), |v| format!("`{v}`"));
        w(
            out,
            format_args!(
                "| `{}{optional}` | `{}` | {default} | {} |\n",
                field.name,
                field.field_type.to_typescript(),
                field.description,
            ),
        );
    }

    if !review.is_empty() {
        out.push_str("\n## Icons to review\n\n");
        for control in review {
            w(
                out,
                format_args!(
                    "- `{}` uses `{}` (confidence {:.2})\n",
                    control.action_name, control.icon_name, control.icon_confidence
                ),
            );
        }
    }
    Ok(())
}

// Writing into a String cannot fail.
fn w(out: &mut String, args: std::fmt::Arguments<'_>) {
    let _ = out.write_fmt(args);
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("`{i}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parameters(control: &ZoneControl) -> String {
    let mut parts = Vec::new();
    if let Some(slider) = &control.slider {
        parts.push(format!(
            "`{}` {}..{} step {}",
            slider.parameter, slider.min, slider.max, slider.step
        ));
    }
    for (name, value) in &control.preset {
        parts.push(format!("`{name}={value}`"));
    }
    if parts.is_empty() {
        "-".to_owned()
    } else {
        parts.join(", ")
    }
}
