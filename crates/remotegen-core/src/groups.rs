// ── Command group derivation ──
//
// Group metadata is either served alongside a config or derived from the
// commands themselves. Derivation is a pure function of the command map,
// so it is idempotent and independent of command insertion order.

use std::collections::BTreeMap;

use heck::ToTitleCase;

use crate::model::{DEFAULT_GROUP, DeviceConfig, DeviceGroup, DeviceGroups, GroupAction};

const ACTIVE: &str = "active";

/// Derive group metadata from a device's commands.
///
/// Every distinct explicit group becomes a `DeviceGroup`; ungrouped commands
/// land in the synthetic `default` group, which is always present exactly
/// once (first), even when empty.
pub fn derive_groups(config: &DeviceConfig) -> DeviceGroups {
    let mut buckets: BTreeMap<&str, Vec<GroupAction>> = BTreeMap::new();
    buckets.entry(DEFAULT_GROUP).or_default();

    // `commands` is a BTreeMap, so actions land in key order regardless of
    // how the source file ordered them.
    for (key, command) in &config.commands {
        let group = command.group_name().unwrap_or(DEFAULT_GROUP);
        buckets.entry(group).or_default().push(GroupAction {
            name: key.clone(),
            description: command.description.clone(),
            params: command.parameters().to_vec(),
        });
    }

    let mut groups: Vec<DeviceGroup> = Vec::with_capacity(buckets.len());
    if let Some(actions) = buckets.remove(DEFAULT_GROUP) {
        groups.push(group(DEFAULT_GROUP, actions));
    }
    groups.extend(buckets.into_iter().map(|(id, actions)| group(id, actions)));

    DeviceGroups {
        device_id: config.device_id.clone(),
        groups,
    }
}

/// Ensure a served group list carries the `default` group exactly once.
pub fn with_default_group(mut groups: DeviceGroups) -> DeviceGroups {
    let mut seen_default = false;
    groups.groups.retain(|g| {
        if g.group_id != DEFAULT_GROUP {
            return true;
        }
        let keep = !seen_default;
        seen_default = true;
        keep
    });
    if !seen_default {
        groups.groups.insert(0, group(DEFAULT_GROUP, Vec::new()));
    }
    groups
}

/// Copy of `config` where every command's group is either a declared group
/// id or `None` (ungrouped).
pub fn normalize(config: &DeviceConfig, groups: &DeviceGroups) -> DeviceConfig {
    let mut normalized = config.clone();
    for (key, command) in &mut normalized.commands {
        let declared = command
            .group_name()
            .filter(|g| *g != DEFAULT_GROUP && groups.contains(g))
            .map(str::to_owned);
        if declared.is_none() && command.group_name().is_some_and(|g| g != DEFAULT_GROUP) {
            tracing::debug!(
                device_id = %config.device_id,
                command = %key,
                group = ?command.group,
                "undeclared group, treating command as ungrouped"
            );
        }
        command.group = declared;
    }
    normalized
}

fn group(id: &str, actions: Vec<GroupAction>) -> DeviceGroup {
    DeviceGroup {
        group_id: id.to_owned(),
        group_name: id.to_title_case(),
        actions,
        status: ACTIVE.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::DeviceCommand;
    use pretty_assertions::assert_eq;

    fn command(group: Option<&str>) -> DeviceCommand {
        DeviceCommand {
            action: "x".into(),
            location: "rack".into(),
            description: String::new(),
            group: group.map(str::to_owned),
            params: None,
        }
    }

    fn config(entries: &[(&str, Option<&str>)]) -> DeviceConfig {
        DeviceConfig {
            device_id: "tv".into(),
            device_name: "TV".into(),
            device_class: "network_display".into(),
            commands: entries
                .iter()
                .map(|(k, g)| ((*k).to_owned(), command(*g)))
                .collect(),
            state_schema: None,
        }
    }

    #[test]
    fn exactly_one_default_group() {
        let groups = derive_groups(&config(&[
            ("power_on", Some("power")),
            ("up", None),
            ("down", Some("default")),
        ]));
        let defaults = groups
            .groups
            .iter()
            .filter(|g| g.group_id == DEFAULT_GROUP)
            .count();
        assert_eq!(defaults, 1);
        assert_eq!(groups.groups[0].group_id, DEFAULT_GROUP);
        assert_eq!(groups.groups[0].actions.len(), 2);
    }

    #[test]
    fn default_present_when_everything_is_grouped() {
        let groups = derive_groups(&config(&[("mute", Some("volume"))]));
        assert_eq!(groups.groups[0].group_id, DEFAULT_GROUP);
        assert!(groups.groups[0].actions.is_empty());
        assert_eq!(groups.get("volume").unwrap().group_name, "Volume");
    }

    #[test]
    fn derivation_ignores_insertion_order() {
        let a = derive_groups(&config(&[
            ("b", Some("menu")),
            ("a", None),
            ("c", Some("apps")),
        ]));
        let b = derive_groups(&config(&[
            ("c", Some("apps")),
            ("a", None),
            ("b", Some("menu")),
        ]));
        assert_eq!(a, b);
    }

    #[test]
    fn derivation_is_idempotent() {
        let cfg = config(&[("a", Some("menu")), ("b", None)]);
        assert_eq!(derive_groups(&cfg), derive_groups(&cfg));
    }

    #[test]
    fn undeclared_group_is_treated_as_ungrouped() {
        let cfg = config(&[("a", Some("menu")), ("b", Some("ghost"))]);
        let declared = DeviceGroups {
            device_id: "tv".into(),
            groups: vec![group("menu", Vec::new())],
        };
        let normalized = normalize(&cfg, &declared);
        assert_eq!(normalized.commands["a"].group.as_deref(), Some("menu"));
        assert_eq!(normalized.commands["b"].group, None);
    }

    #[test]
    fn served_groups_gain_default() {
        let served = DeviceGroups {
            device_id: "tv".into(),
            groups: vec![group("menu", Vec::new())],
        };
        let fixed = with_default_group(served);
        assert_eq!(fixed.groups[0].group_id, DEFAULT_GROUP);
        assert_eq!(fixed.groups.len(), 2);
        assert_eq!(with_default_group(fixed.clone()), fixed);
    }
}
