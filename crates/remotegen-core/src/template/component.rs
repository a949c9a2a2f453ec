// Device page component rendering.

use std::collections::BTreeSet;

use super::{Code, HEADER, TemplateGenerator, ts_key, ts_number, ts_string};
use crate::error::CoreError;
use crate::model::{
    NavigationCluster, PointerPad, RemoteDeviceStructure, RemoteZone, SpecialCase,
    VolumeControl, ZoneContent, ZoneControl,
};
use crate::naming;

/// Zone content indentation inside `<RemoteZone>`.
const BODY: usize = 4;

impl TemplateGenerator {
    /// Render the page component for a device.
    pub fn generate_component(
        &self,
        structure: &RemoteDeviceStructure,
    ) -> Result<String, CoreError> {
        let component = naming::component_name(&structure.device_id)?;
        let hook = naming::hook_name(&structure.device_id)?;
        let domains = structure.power_domains().is_some();

        let mut used = BTreeSet::from(["RemotePage", "RemoteZone"]);
        let mut zones = Code::default();
        for zone in &structure.remote_zones {
            render_zone(&mut zones, zone, domains, &mut used);
        }

        let mut out = Code::default();
        out.line(0, HEADER);
        out.line(
            0,
            format!(
                "// Device: {} ({}), class {}",
                naming::comment_text(&structure.device_name),
                structure.device_id,
                naming::comment_text(&structure.device_class)
            ),
        );
        out.blank();
        out.line(
            0,
            format!(
                "import {{ {} }} from {};",
                used.iter().copied().collect::<Vec<_>>().join(", "),
                ts_string(&self.components_import)
            ),
        );
        out.line(
            0,
            format!(
                "import {{ sendDeviceAction }} from {};",
                ts_string(&self.hooks_import)
            ),
        );
        if self.state_hooks {
            out.line(
                0,
                format!(
                    "import {{ {hook} }} from {};",
                    ts_string(&format!("../hooks/{hook}"))
                ),
            );
        }
        out.blank();
        out.line(
            0,
            format!("const DEVICE_ID = {};", ts_string(&structure.device_id)),
        );

        let delegating = structure.is_delegating();
        if delegating {
            out.blank();
            out.line(0, "const ACTION_LOCATIONS: Record<string, string> = {");
            for handler in &structure.action_handlers {
                out.line(
                    1,
                    format!(
                        "{}: {},",
                        ts_key(&handler.action_name),
                        ts_string(&handler.location)
                    ),
                );
            }
            out.line(0, "};");
        }

        out.blank();
        out.line(0, format!("export function {component}() {{"));
        if self.state_hooks {
            out.line(1, format!("const state = {hook}();"));
        }
        out.line(
            1,
            "const run = (action: string, params?: Record<string, unknown>) =>",
        );
        if delegating {
            out.line(
                2,
                "sendDeviceAction(ACTION_LOCATIONS[action] ?? DEVICE_ID, action, params);",
            );
        } else {
            out.line(2, "sendDeviceAction(DEVICE_ID, action, params);");
        }
        out.blank();
        out.line(1, "return (");
        let state_prop = if self.state_hooks { " state={state}" } else { "" };
        let stateless = if structure.special_cases.contains(&SpecialCase::Stateless) {
            " stateless"
        } else {
            ""
        };
        out.line(
            2,
            format!(
                "<RemotePage deviceId={{DEVICE_ID}} title={}{state_prop}{stateless}>",
                ts_string(&structure.device_name)
            ),
        );
        out.buf.push_str(&zones.finish());
        out.line(2, "</RemotePage>");
        out.line(1, ");");
        out.line(0, "}");
        out.blank();
        out.line(0, format!("export default {component};"));
        Ok(out.finish())
    }
}

fn render_zone(
    out: &mut Code,
    zone: &RemoteZone,
    domains: bool,
    used: &mut BTreeSet<&'static str>,
) {
    let open = format!(
        "<RemoteZone id={} title={} layout={}",
        ts_string(zone.zone_id.as_ref()),
        ts_string(&zone.zone_name),
        ts_string(&zone.layout.to_string())
    );
    if zone.is_empty {
        out.line(3, format!("{open} empty />"));
        return;
    }
    out.line(3, format!("{open}>"));

    match &zone.content {
        ZoneContent::Empty => {}
        ZoneContent::PowerButtons { buttons } => {
            for button in buttons {
                let extra = if domains {
                    format!(" domain={}", ts_string(&button.domain))
                } else {
                    String::new()
                };
                render_control(out, BODY, &button.control, &extra, used);
            }
        }
        ZoneContent::MediaStack {
            inputs,
            playback,
            tracks,
        } => {
            for (title, controls) in [("Inputs", inputs), ("Playback", playback), ("Tracks", tracks)]
            {
                if controls.is_empty() {
                    continue;
                }
                used.insert("ZoneSection");
                out.line(BODY, format!("<ZoneSection title={}>", ts_string(title)));
                for control in controls {
                    render_control(out, BODY + 1, control, "", used);
                }
                out.line(BODY, "</ZoneSection>");
            }
        }
        ZoneContent::ScreenActions { actions } => {
            for control in actions {
                render_control(out, BODY, control, "", used);
            }
        }
        ZoneContent::Volume(VolumeControl::Slider { slider, extra }) => {
            render_control(out, BODY, slider, "", used);
            for control in extra {
                render_control(out, BODY, control, "", used);
            }
        }
        ZoneContent::Volume(VolumeControl::Buttons { buttons }) => {
            for control in buttons {
                render_control(out, BODY, control, "", used);
            }
        }
        ZoneContent::AppsDropdown { apps } => render_apps(out, apps, used),
        ZoneContent::NavigationCluster(nav) => render_navigation(out, nav, used),
        ZoneContent::PointerPad(pad) => render_pointer(out, pad, used),
    }

    out.line(3, "</RemoteZone>");
}

/// Argument list for `run(...)` carrying the control's preset parameters,
/// plus `extra` (already rendered `key: expr`) when given.
fn run_call(control: &ZoneControl, extra: Option<String>) -> String {
    let mut entries: Vec<String> = control
        .preset
        .iter()
        .filter(|(name, _)| {
            control
                .slider
                .as_ref()
                .is_none_or(|s| &s.parameter != *name)
        })
        .map(|(name, value)| format!("{}: {value}", ts_key(name)))
        .collect();
    entries.extend(extra);

    let action = ts_string(&control.action_name);
    if entries.is_empty() {
        format!("run({action})")
    } else {
        format!("run({action}, {{ {} }})", entries.join(", "))
    }
}

fn render_control(
    out: &mut Code,
    indent: usize,
    control: &ZoneControl,
    extra_props: &str,
    used: &mut BTreeSet<&'static str>,
) {
    let common = format!(
        "action={} label={} icon={}{}{}",
        ts_string(&control.action_name),
        ts_string(&control.display_name),
        ts_string(&control.icon_name),
        if control.emphasize { " emphasize" } else { "" },
        extra_props
    );

    match &control.slider {
        Some(slider) => {
            used.insert("ActionSlider");
            let default = slider
                .default
                .map(|d| format!(" defaultValue={{{}}}", ts_number(d)))
                .unwrap_or_default();
            let call = run_call(
                control,
                Some(format!("{}: value", ts_key(&slider.parameter))),
            );
            out.line(
                indent,
                format!(
                    "<ActionSlider {common} min={{{}}} max={{{}}} step={{{}}}{default} onChange={{(value: number) => {call}}} />",
                    ts_number(slider.min),
                    ts_number(slider.max),
                    ts_number(slider.step),
                ),
            );
        }
        None => {
            used.insert("ActionButton");
            let call = run_call(control, None);
            out.line(
                indent,
                format!("<ActionButton {common} onPress={{() => {call}}} />"),
            );
        }
    }
}

fn render_apps(out: &mut Code, apps: &[ZoneControl], used: &mut BTreeSet<&'static str>) {
    used.insert("AppsDropdown");
    out.line(BODY, "<AppsDropdown");
    out.line(BODY + 1, "options={[");
    for app in apps {
        out.line(
            BODY + 2,
            format!(
                "{{ action: {}, label: {}, icon: {} }},",
                ts_string(&app.action_name),
                ts_string(&app.display_name),
                ts_string(&app.icon_name)
            ),
        );
    }
    out.line(BODY + 1, "]}");
    out.line(BODY + 1, "onSelect={(action: string) => run(action)}");
    out.line(BODY, "/>");
}

fn render_navigation(out: &mut Code, nav: &NavigationCluster, used: &mut BTreeSet<&'static str>) {
    let slots = [
        ("onUp", &nav.up),
        ("onDown", &nav.down),
        ("onLeft", &nav.left),
        ("onRight", &nav.right),
        ("onOk", &nav.ok),
    ];
    if slots.iter().any(|(_, c)| c.is_some()) {
        used.insert("NavCluster");
        out.line(BODY, "<NavCluster");
        for (prop, control) in slots {
            if let Some(control) = control {
                out.line(
                    BODY + 1,
                    format!("{prop}={{() => {}}}", run_call(control, None)),
                );
            }
        }
        out.line(BODY, "/>");
    }
    for control in &nav.extra {
        render_control(out, BODY, control, "", used);
    }
}

fn render_pointer(out: &mut Code, pad: &PointerPad, used: &mut BTreeSet<&'static str>) {
    let slots = [
        ("onMove", &pad.move_action, true),
        ("onClick", &pad.click, false),
        ("onScroll", &pad.scroll, true),
    ];
    if slots.iter().any(|(_, c, _)| c.is_some()) {
        used.insert("PointerPad");
        out.line(BODY, "<PointerPad");
        for (prop, control, takes_delta) in slots {
            let Some(control) = control else { continue };
            let handler = if takes_delta {
                format!(
                    "(params: Record<string, unknown>) => run({}, params)",
                    ts_string(&control.action_name)
                )
            } else {
                format!("() => {}", run_call(control, None))
            };
            out.line(BODY + 1, format!("{prop}={{{handler}}}"));
        }
        out.line(BODY, "/>");
    }
    for control in &pad.extra {
        render_control(out, BODY, control, "", used);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        ActionHandler, ControlKind, PowerButton, SliderSpec, StateDefinition, ZoneId,
    };
    use pretty_assertions::assert_eq;

    fn control(name: &str) -> ZoneControl {
        ZoneControl {
            action_name: name.into(),
            display_name: name.into(),
            icon_name: "Help".into(),
            icon_confidence: 0.1,
            control: ControlKind::Button,
            emphasize: false,
            slider: None,
            preset: Default::default(),
        }
    }

    fn structure(zones: Vec<RemoteZone>, special_cases: Vec<SpecialCase>) -> RemoteDeviceStructure {
        RemoteDeviceStructure {
            device_id: "den_tv".into(),
            device_name: "Den TV".into(),
            device_class: "network_display".into(),
            remote_zones: zones,
            state_interface: StateDefinition::fallback("DenTvState"),
            action_handlers: vec![ActionHandler {
                action_name: "power_on".into(),
                location: "den".into(),
                zone: ZoneId::Power,
                takes_parameters: false,
            }],
            special_cases,
        }
    }

    #[test]
    fn multiline_device_name_keeps_the_header_parseable() {
        let mut s = structure(Vec::new(), Vec::new());
        s.device_name = "Den\nTV".into();
        let out = TemplateGenerator::default().generate_component(&s).unwrap();
        assert!(out.contains("// Device: Den TV (den_tv), class network_display\n"));

        let entry = crate::manifest::entry_from_page("pages/den_tv.tsx", &out, chrono::Utc::now()).unwrap();
        assert_eq!(entry.id, "den_tv");
        assert_eq!(entry.name, "Den TV");
    }

    #[test]
    fn component_is_deterministic() {
        let s = structure(
            vec![RemoteZone::new(
                ZoneId::Power,
                ZoneContent::PowerButtons {
                    buttons: vec![PowerButton {
                        domain: "main".into(),
                        control: control("power_on"),
                    }],
                },
            )],
            Vec::new(),
        );
        let generator = TemplateGenerator::default();
        let a = generator.generate_component(&s).unwrap();
        let b = generator.generate_component(&s).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("export function DenTvPage()"));
        assert!(a.contains("export default DenTvPage;"));
        assert!(a.contains(r#"onPress={() => run("power_on")}"#));
        assert!(!a.contains("domain="));
    }

    #[test]
    fn empty_always_rendered_zone_is_a_bare_container() {
        let s = structure(
            vec![RemoteZone::new(ZoneId::Volume, ZoneContent::Empty)],
            Vec::new(),
        );
        let out = TemplateGenerator::default().generate_component(&s).unwrap();
        assert!(out.contains(r#"<RemoteZone id="volume" title="Volume" layout="column" empty />"#));
        assert!(out.contains("import { RemotePage, RemoteZone } from"));
    }

    #[test]
    fn slider_renders_bounds_and_step() {
        let slider = ZoneControl {
            control: ControlKind::Slider,
            slider: Some(SliderSpec {
                parameter: "level".into(),
                min: 0.0,
                max: 10.0,
                step: 1.0,
                default: Some(5.0),
            }),
            ..control("set_volume")
        };
        let s = structure(
            vec![RemoteZone::new(
                ZoneId::Volume,
                ZoneContent::Volume(VolumeControl::Slider {
                    slider,
                    extra: Vec::new(),
                }),
            )],
            Vec::new(),
        );
        let out = TemplateGenerator::default()
            .with_state_hooks(false)
            .generate_component(&s)
            .unwrap();
        insta::assert_snapshot!(
            out.lines().find(|l| l.contains("<ActionSlider")).unwrap().trim(),
            @r#"<ActionSlider action="set_volume" label="set_volume" icon="Help" min={0} max={10} step={1} defaultValue={5} onChange={(value: number) => run("set_volume", { level: value })} />"#
        );
        assert!(!out.contains("useDenTvState"));
    }

    #[test]
    fn delegating_structure_routes_through_locations() {
        let s = structure(
            Vec::new(),
            vec![SpecialCase::DelegatedActions {
                targets: vec!["den".into()],
            }],
        );
        let out = TemplateGenerator::default().generate_component(&s).unwrap();
        assert!(out.contains("const ACTION_LOCATIONS: Record<string, string> = {"));
        assert!(out.contains(r#"power_on: "den","#));
        assert!(out.contains("ACTION_LOCATIONS[action] ?? DEVICE_ID"));
    }

    #[test]
    fn power_domains_are_rendered() {
        let s = structure(
            vec![RemoteZone::new(
                ZoneId::Power,
                ZoneContent::PowerButtons {
                    buttons: vec![PowerButton {
                        domain: "zone2".into(),
                        control: control("zone2_power_on"),
                    }],
                },
            )],
            vec![SpecialCase::PowerDomains {
                domains: vec!["main".into(), "zone2".into()],
            }],
        );
        let out = TemplateGenerator::default().generate_component(&s).unwrap();
        assert!(out.contains(r#"domain="zone2""#));
    }

    #[test]
    fn preset_parameters_travel_with_triggers() {
        let mut c = control("set_input");
        c.preset
            .insert("source".into(), serde_json::Value::String("hdmi1".into()));
        assert_eq!(run_call(&c, None), r#"run("set_input", { source: "hdmi1" })"#);
    }
}
