// ── Zone classifier ──
//
// Maps processed actions onto the seven fixed remote zones. Matching is a
// ranked keyword table: group names first (for grouped actions), then the
// action name. Keywords match as case-insensitive substrings in either
// direction, the first qualifying zone in declaration order wins, and
// every action lands in at most one zone.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{
    DEFAULT_GROUP, DeviceGroups, NavigationCluster, PointerPad, PowerButton, ProcessedAction,
    RemoteZone, VolumeControl, ZoneContent, ZoneControl, ZoneId,
};

/// Power domain used when a family does not split power.
pub const MAIN_POWER_DOMAIN: &str = "main";

/// Keyword rule for one zone.
#[derive(Debug, Clone, Copy)]
pub struct ZoneRule {
    pub zone: ZoneId,
    pub group_keywords: &'static [&'static str],
    pub action_keywords: &'static [&'static str],
    /// Names containing any of these never match this zone by action name.
    pub action_exclusions: &'static [&'static str],
}

/// Declaration order is the tie-break order.
pub static ZONE_RULES: &[ZoneRule] = &[
    ZoneRule {
        zone: ZoneId::Power,
        group_keywords: &["power"],
        action_keywords: &[
            "power_on", "power_off", "power", "standby", "wake", "turn_on", "turn_off",
        ],
        action_exclusions: &[],
    },
    ZoneRule {
        zone: ZoneId::MediaStack,
        group_keywords: &[
            "inputs", "input", "source", "playback", "media", "tracks", "track",
        ],
        action_keywords: &[
            "input", "source", "play", "pause", "stop", "next", "previous", "track", "rewind",
            "forward", "seek",
        ],
        action_exclusions: &["display"],
    },
    ZoneRule {
        zone: ZoneId::Screen,
        group_keywords: &["screen", "display", "picture", "aspect", "video"],
        action_keywords: &[
            "aspect", "zoom", "picture", "screen", "display", "subtitle", "ratio",
        ],
        action_exclusions: &[],
    },
    ZoneRule {
        zone: ZoneId::Volume,
        group_keywords: &["volume", "audio", "sound"],
        action_keywords: &["volume", "mute", "set_volume"],
        action_exclusions: &[],
    },
    ZoneRule {
        zone: ZoneId::Apps,
        group_keywords: &["apps", "applications", "app"],
        action_keywords: &["app", "launch", "netflix", "youtube"],
        action_exclusions: &[],
    },
    ZoneRule {
        zone: ZoneId::Menu,
        group_keywords: &["menu", "navigation", "nav"],
        action_keywords: &[
            "menu", "up", "down", "left", "right", "ok", "enter", "select", "back", "home",
            "exit", "settings", "guide", "info",
        ],
        action_exclusions: &[],
    },
    ZoneRule {
        zone: ZoneId::Pointer,
        group_keywords: &["pointer", "mouse", "cursor"],
        action_keywords: &[
            "pointer", "mouse", "cursor", "click", "move_cursor", "scroll", "drag",
        ],
        action_exclusions: &[],
    },
];

/// Case-insensitive substring match in both directions. Empty strings
/// never match.
fn keyword_match(text: &str, keyword: &str) -> bool {
    if text.is_empty() || keyword.is_empty() {
        return false;
    }
    text.contains(keyword) || keyword.contains(text)
}

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| keyword_match(text, k))
}

/// Zone for a single action, or `None` when nothing matches.
pub fn assign_zone(groups: &DeviceGroups, action: &ProcessedAction) -> Option<ZoneId> {
    if action.group != DEFAULT_GROUP {
        let mut names = vec![action.group.to_lowercase()];
        if let Some(group) = groups.get(&action.group) {
            names.push(group.group_name.to_lowercase());
        }
        let by_group = ZONE_RULES.iter().find(|rule| {
            names
                .iter()
                .any(|name| matches_any(name, rule.group_keywords))
        });
        if let Some(rule) = by_group {
            return Some(rule.zone);
        }
    }

    let name = action.action_name.to_lowercase();
    ZONE_RULES
        .iter()
        .filter(|rule| !rule.action_exclusions.iter().any(|x| name.contains(x)))
        .find(|rule| matches_any(&name, rule.action_keywords))
        .map(|rule| rule.zone)
}

/// Partition actions by zone, preserving input order within a zone.
/// Unmatched actions are dropped with a debug log.
pub fn assign_zones<'a>(
    groups: &DeviceGroups,
    actions: &'a [ProcessedAction],
) -> BTreeMap<ZoneId, Vec<&'a ProcessedAction>> {
    let mut zones: BTreeMap<ZoneId, Vec<&ProcessedAction>> = BTreeMap::new();
    for action in actions {
        match assign_zone(groups, action) {
            Some(zone) => zones.entry(zone).or_default().push(action),
            None => debug!(
                device_id = %groups.device_id,
                action = %action.action_name,
                "no zone matches, dropping from layout"
            ),
        }
    }
    zones
}

/// Classify into zones with every power key on the main domain.
pub fn classify(groups: &DeviceGroups, actions: &[ProcessedAction]) -> Vec<RemoteZone> {
    classify_with(groups, actions, |_| MAIN_POWER_DOMAIN.to_owned())
}

/// Classify into zones, asking `power_domain` which domain each power
/// action drives.
///
/// Always-rendered zones (`show_hide == false`) are emitted even when empty;
/// the rest are omitted when empty. Output follows zone declaration order.
pub fn classify_with(
    groups: &DeviceGroups,
    actions: &[ProcessedAction],
    power_domain: impl Fn(&ProcessedAction) -> String,
) -> Vec<RemoteZone> {
    let mut assigned = assign_zones(groups, actions);

    ZoneId::ALL
        .into_iter()
        .filter_map(|zone| {
            let members = assigned.remove(&zone).unwrap_or_default();
            let content = match zone {
                ZoneId::Power => power_content(&members, &power_domain),
                ZoneId::MediaStack => media_content(&members),
                ZoneId::Screen => ZoneContent::ScreenActions {
                    actions: controls(&members),
                },
                ZoneId::Volume => volume_content(&members),
                ZoneId::Apps => ZoneContent::AppsDropdown {
                    apps: controls(&members),
                },
                ZoneId::Menu => ZoneContent::NavigationCluster(navigation(&members)),
                ZoneId::Pointer => ZoneContent::PointerPad(pointer(&members)),
            };
            let zone = RemoteZone::new(zone, content);
            (!zone.is_empty || !zone.show_hide).then_some(zone)
        })
        .collect()
}

// ── Content builders ────────────────────────────────────────────────

fn controls(actions: &[&ProcessedAction]) -> Vec<ZoneControl> {
    actions.iter().map(|a| ZoneControl::from_action(a)).collect()
}

fn name_is(action: &ProcessedAction, words: &[&str]) -> bool {
    let name = action.action_name.to_lowercase();
    words.iter().any(|w| {
        name == *w || name.ends_with(&format!("_{w}")) || name.starts_with(&format!("{w}_"))
    })
}

fn is_discrete_power(action: &ProcessedAction) -> bool {
    !action.has_parameters()
        && ["on", "off", "power_on", "power_off", "turn_on", "turn_off"]
            .iter()
            .any(|w| {
                let name = action.action_name.to_lowercase();
                name == *w || name.ends_with(&format!("_{w}"))
            })
}

fn is_discrete_step(action: &ProcessedAction) -> bool {
    !action.is_continuous() && name_is(action, &["up", "down", "increase", "decrease"])
}

/// Parameterized power actions win over discrete on/off keys, per domain.
fn power_content(
    actions: &[&ProcessedAction],
    power_domain: &impl Fn(&ProcessedAction) -> String,
) -> ZoneContent {
    let mut by_domain: BTreeMap<String, Vec<&ProcessedAction>> = BTreeMap::new();
    for action in actions {
        by_domain.entry(power_domain(action)).or_default().push(action);
    }

    let mut buttons = Vec::new();
    for (domain, members) in by_domain {
        let has_parameterized = members.iter().any(|a| a.has_parameters());
        buttons.extend(
            members
                .into_iter()
                .filter(|a| !(has_parameterized && is_discrete_power(a)))
                .map(|a| PowerButton {
                    domain: domain.clone(),
                    control: ZoneControl::from_action(a),
                }),
        );
    }
    ZoneContent::PowerButtons { buttons }
}

fn media_content(actions: &[&ProcessedAction]) -> ZoneContent {
    let mut inputs = Vec::new();
    let mut playback = Vec::new();
    let mut tracks = Vec::new();
    for action in actions {
        let name = action.action_name.to_lowercase();
        let control = ZoneControl::from_action(action);
        if name.contains("input") || name.contains("source") {
            inputs.push(control);
        } else if ["next", "previous", "prev", "track", "skip"]
            .iter()
            .any(|k| name.contains(k))
        {
            tracks.push(control);
        } else {
            playback.push(control);
        }
    }
    ZoneContent::MediaStack {
        inputs,
        playback,
        tracks,
    }
}

/// A continuous level control wins over discrete up/down keys; the keys are
/// kept only when no continuous form exists.
fn volume_content(actions: &[&ProcessedAction]) -> ZoneContent {
    let Some(slider) = actions.iter().find(|a| a.is_continuous()) else {
        return ZoneContent::Volume(VolumeControl::Buttons {
            buttons: controls(actions),
        });
    };

    let extra = actions
        .iter()
        .filter(|a| a.action_name != slider.action_name && !is_discrete_step(a))
        .map(|a| ZoneControl::from_action(a))
        .collect();
    ZoneContent::Volume(VolumeControl::Slider {
        slider: ZoneControl::from_action(slider),
        extra,
    })
}

fn navigation(actions: &[&ProcessedAction]) -> NavigationCluster {
    let mut nav = NavigationCluster::default();
    for action in actions {
        let control = ZoneControl::from_action(action);
        let slot = if name_is(action, &["up"]) {
            &mut nav.up
        } else if name_is(action, &["down"]) {
            &mut nav.down
        } else if name_is(action, &["left"]) {
            &mut nav.left
        } else if name_is(action, &["right"]) {
            &mut nav.right
        } else if name_is(action, &["ok", "enter", "select"]) {
            &mut nav.ok
        } else {
            nav.extra.push(control);
            continue;
        };
        if slot.is_none() {
            *slot = Some(control);
        } else {
            nav.extra.push(control);
        }
    }
    nav
}

fn pointer(actions: &[&ProcessedAction]) -> PointerPad {
    let mut pad = PointerPad::default();
    for action in actions {
        let name = action.action_name.to_lowercase();
        let control = ZoneControl::from_action(action);
        let slot = if name.contains("move") || name.contains("drag") {
            &mut pad.move_action
        } else if name.contains("click") {
            &mut pad.click
        } else if name.contains("scroll") {
            &mut pad.scroll
        } else {
            pad.extra.push(control);
            continue;
        };
        if slot.is_none() {
            *slot = Some(control);
        } else {
            pad.extra.push(control);
        }
    }
    pad
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::icons::select_icon;
    use crate::model::{
        CommandParameter, ControlKind, DeviceGroup, ParameterType, ProcessedParameter, UiHints,
    };
    use pretty_assertions::assert_eq;

    fn action(name: &str, group: &str) -> ProcessedAction {
        ProcessedAction {
            action_name: name.into(),
            display_name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            group: group.into(),
            location: "rack".into(),
            icon: select_icon(name, &[]),
            ui_hints: UiHints {
                control: ControlKind::Button,
                emphasize: false,
                tooltip: None,
            },
        }
    }

    fn ranged(name: &str, group: &str) -> ProcessedAction {
        let param = CommandParameter {
            name: "level".into(),
            param_type: ParameterType::Range,
            required: true,
            default: None,
            min: Some(0.0),
            max: Some(100.0),
            description: String::new(),
        };
        ProcessedAction {
            parameters: vec![ProcessedParameter::from(&param)],
            ..action(name, group)
        }
    }

    fn groups(ids: &[&str]) -> DeviceGroups {
        DeviceGroups {
            device_id: "dev".into(),
            groups: ids
                .iter()
                .map(|id| DeviceGroup {
                    group_id: (*id).into(),
                    group_name: (*id).into(),
                    actions: Vec::new(),
                    status: "active".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn group_match_beats_action_name() {
        let g = groups(&["default", "navigation"]);
        // "volume_up" would land in volume by name; its group says menu.
        let a = action("volume_up", "navigation");
        assert_eq!(assign_zone(&g, &a), Some(ZoneId::Menu));
    }

    #[test]
    fn unmatched_group_falls_back_to_action_name() {
        let g = groups(&["default", "misc"]);
        assert_eq!(assign_zone(&g, &action("mute", "misc")), Some(ZoneId::Volume));
    }

    #[test]
    fn tie_break_follows_zone_order() {
        let g = groups(&["default"]);
        // Matches both power ("power") and menu ("menu").
        assert_eq!(
            assign_zone(&g, &action("power_menu", "default")),
            Some(ZoneId::Power)
        );
        assert_eq!(
            assign_zone(&g, &action("display_mode", "default")),
            Some(ZoneId::Screen)
        );
    }

    #[test]
    fn reverse_substring_matches_short_names() {
        let g = groups(&["default"]);
        assert_eq!(assign_zone(&g, &action("on", "default")), Some(ZoneId::Power));
        assert_eq!(assign_zone(&g, &action("OK", "default")), Some(ZoneId::Menu));
    }

    #[test]
    fn every_action_lands_in_at_most_one_zone() {
        let g = groups(&["default"]);
        let actions: Vec<_> = [
            "power_on", "volume_up", "mute", "up", "ok", "netflix", "click", "zoom", "play",
            "defrost",
        ]
        .iter()
        .map(|n| action(n, "default"))
        .collect();
        let zones = assign_zones(&g, &actions);
        let placed: usize = zones.values().map(Vec::len).sum();
        assert_eq!(placed, 9);
        let mut names: Vec<_> = zones
            .values()
            .flatten()
            .map(|a| a.action_name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn classification_is_idempotent() {
        let g = groups(&["default"]);
        let actions = vec![action("power_on", "default"), action("up", "default")];
        assert_eq!(classify(&g, &actions), classify(&g, &actions));
    }

    #[test]
    fn always_rendered_zones_are_emitted_empty() {
        let g = groups(&["default"]);
        let zones = classify(&g, &[action("volume_up", "default")]);
        let ids: Vec<_> = zones.iter().map(|z| z.zone_id).collect();
        assert_eq!(ids, vec![ZoneId::Power, ZoneId::Volume, ZoneId::Menu]);
        assert!(zones[0].is_empty);
        assert!(!zones[1].is_empty);
        assert!(zones[2].is_empty);
    }

    #[test]
    fn volume_slider_replaces_discrete_keys() {
        let g = groups(&["default"]);
        let actions = vec![
            action("volume_up", "default"),
            action("volume_down", "default"),
            action("mute", "default"),
            ranged("set_volume", "default"),
        ];
        let zones = classify(&g, &actions);
        let volume = zones.iter().find(|z| z.zone_id == ZoneId::Volume).unwrap();
        match &volume.content {
            ZoneContent::Volume(VolumeControl::Slider { slider, extra }) => {
                assert_eq!(slider.action_name, "set_volume");
                assert_eq!(slider.control, ControlKind::Slider);
                let names: Vec<_> = extra.iter().map(|c| c.action_name.as_str()).collect();
                assert_eq!(names, vec!["mute"]);
            }
            other => panic!("expected slider, got {other:?}"),
        }
    }

    #[test]
    fn volume_buttons_without_continuous_form() {
        let g = groups(&["default"]);
        let actions = vec![action("volume_up", "default"), action("volume_down", "default")];
        let zones = classify(&g, &actions);
        let volume = zones.iter().find(|z| z.zone_id == ZoneId::Volume).unwrap();
        assert!(matches!(
            &volume.content,
            ZoneContent::Volume(VolumeControl::Buttons { buttons }) if buttons.len() == 2
        ));
    }

    #[test]
    fn parameterized_power_wins_per_domain() {
        let g = groups(&["default"]);
        let actions = vec![
            action("power_on", "default"),
            action("power_off", "default"),
            ranged("power", "default"),
            action("zone2_power_on", "default"),
        ];
        let zones = classify_with(&g, &actions, |a| {
            if a.action_name.starts_with("zone2") {
                "zone2".into()
            } else {
                MAIN_POWER_DOMAIN.into()
            }
        });
        let ZoneContent::PowerButtons { buttons } = &zones[0].content else {
            panic!("expected power buttons");
        };
        let names: Vec<_> = buttons
            .iter()
            .map(|b| (b.domain.as_str(), b.control.action_name.as_str()))
            .collect();
        assert_eq!(names, vec![("main", "power"), ("zone2", "zone2_power_on")]);
    }

    #[test]
    fn navigation_slots() {
        let g = groups(&["default"]);
        let actions: Vec<_> = ["up", "down", "left", "right", "ok", "menu_up", "back"]
            .iter()
            .map(|n| action(n, "default"))
            .collect();
        let zones = classify(&g, &actions);
        let menu = zones.iter().find(|z| z.zone_id == ZoneId::Menu).unwrap();
        let ZoneContent::NavigationCluster(nav) = &menu.content else {
            panic!("expected navigation cluster");
        };
        assert_eq!(nav.up.as_ref().unwrap().action_name, "up");
        assert_eq!(nav.ok.as_ref().unwrap().action_name, "ok");
        let extra: Vec<_> = nav.extra.iter().map(|c| c.action_name.as_str()).collect();
        assert_eq!(extra, vec!["menu_up", "back"]);
    }

    #[test]
    fn media_subsections() {
        let g = groups(&["default"]);
        let actions: Vec<_> = ["input_hdmi1", "play", "pause", "next", "previous"]
            .iter()
            .map(|n| action(n, "default"))
            .collect();
        let zones = classify(&g, &actions);
        let media = zones
            .iter()
            .find(|z| z.zone_id == ZoneId::MediaStack)
            .unwrap();
        let ZoneContent::MediaStack {
            inputs,
            playback,
            tracks,
        } = &media.content
        else {
            panic!("expected media stack");
        };
        assert_eq!(inputs.len(), 1);
        assert_eq!(playback.len(), 2);
        assert_eq!(tracks.len(), 2);
    }
}
