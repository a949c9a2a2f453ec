// ── Device family strategies ──
//
// One closed variant per device family. A family decides where a device's
// state shape comes from, which icon overrides apply, how power keys map
// to power domains and which special cases the template must honor. The
// shared pipeline (normalize groups, process actions, classify zones,
// bind handlers) is the same for every family.

mod audio;
mod display;
mod ir_remote;
mod scenario;

use std::collections::HashMap;

use heck::ToTitleCase;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{self, MAIN_POWER_DOMAIN};
use crate::error::CoreError;
use crate::groups;
use crate::icons::{self, IconRule};
use crate::model::{
    ActionHandler, ControlKind, DEFAULT_GROUP, DeviceConfig, DeviceGroups, ProcessedAction,
    ProcessedParameter, RemoteDeviceStructure, RemoteZone, SpecialCase, StateDefinition, UiHints,
};
use crate::schema::SchemaRef;

/// Device family, resolved from a config's `device_class` tag through a
/// [`FamilyRegistry`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceFamily {
    /// One-way infrared transmitter; cannot report state.
    IrRemote,
    /// Networked TV or display with a queryable state.
    NetworkDisplay,
    /// AV processor with independently powered zones.
    MultizoneAudio,
    /// Virtual device whose actions run on other devices.
    Scenario,
}

/// Where a device's state shape comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StateSource {
    Static(StateDefinition),
    Schema(SchemaRef),
}

impl DeviceFamily {
    pub const ALL: [Self; 4] = [
        Self::IrRemote,
        Self::NetworkDisplay,
        Self::MultizoneAudio,
        Self::Scenario,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::IrRemote => "ir_remote",
            Self::NetworkDisplay => "network_display",
            Self::MultizoneAudio => "multizone_audio",
            Self::Scenario => "scenario",
        }
    }

    /// Alternative tags the registry accepts for this family.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::IrRemote => &["ir", "infrared", "broadlink"],
            Self::NetworkDisplay => &["display", "tv", "smart_tv", "lg_tv"],
            Self::MultizoneAudio => &["av_processor", "receiver", "emotiva_xmc2"],
            Self::Scenario => &["virtual", "scenario_device"],
        }
    }

    /// Resolve the state source for a device. Schema references that do
    /// not parse fall back to the family's static shape.
    pub fn state_source(self, config: &DeviceConfig) -> Result<StateSource, CoreError> {
        let schema = match (self, config.state_schema.as_deref()) {
            (Self::NetworkDisplay | Self::MultizoneAudio, Some(raw)) => {
                match SchemaRef::parse(raw) {
                    Ok(schema) => Some(schema),
                    Err(e) => {
                        tracing::warn!(device_id = %config.device_id, error = %e, "ignoring state schema");
                        None
                    }
                }
            }
            _ => None,
        };
        if let Some(schema) = schema {
            return Ok(StateSource::Schema(schema));
        }

        let interface = crate::naming::state_interface_name(&config.device_id)?;
        Ok(StateSource::Static(match self {
            Self::IrRemote => ir_remote::static_state(interface),
            Self::NetworkDisplay => display::static_state(interface),
            Self::MultizoneAudio => audio::static_state(interface),
            Self::Scenario => scenario::static_state(interface),
        }))
    }

    fn icon_overrides(self) -> &'static [IconRule] {
        match self {
            Self::IrRemote => ir_remote::ICON_OVERRIDES,
            Self::NetworkDisplay => display::ICON_OVERRIDES,
            Self::MultizoneAudio => audio::ICON_OVERRIDES,
            Self::Scenario => &[],
        }
    }

    fn power_domain(self, action: &ProcessedAction) -> String {
        match self {
            Self::MultizoneAudio => audio::power_domain(action),
            _ => MAIN_POWER_DOMAIN.to_owned(),
        }
    }

    fn special_cases(self, config: &DeviceConfig) -> Vec<SpecialCase> {
        match self {
            Self::IrRemote => vec![SpecialCase::Stateless],
            Self::NetworkDisplay => Vec::new(),
            Self::MultizoneAudio => audio::special_cases(config),
            Self::Scenario => scenario::special_cases(config),
        }
    }

    fn check(self, config: &DeviceConfig) -> Result<(), CoreError> {
        match self {
            Self::Scenario => scenario::check(config),
            _ => Ok(()),
        }
    }

    /// Build the structure the template generator renders.
    ///
    /// `state` is resolved beforehand from [`DeviceFamily::state_source`]
    /// (directly, or through schema introspection).
    pub fn analyze_structure(
        self,
        config: &DeviceConfig,
        groups: &DeviceGroups,
        state: StateDefinition,
    ) -> Result<RemoteDeviceStructure, CoreError> {
        crate::naming::check_device_id(&config.device_id)?;
        let groups = groups::with_default_group(groups.clone());
        let config = groups::normalize(config, &groups);
        self.check(&config)?;

        let overrides = self.icon_overrides();
        let actions: Vec<ProcessedAction> = config
            .commands
            .iter()
            .map(|(key, command)| process_action(key, command, overrides))
            .collect();

        let remote_zones = classify::classify_with(&groups, &actions, |a| self.power_domain(a));
        let action_handlers = bind_handlers(&remote_zones, &actions);
        debug!(
            device_id = %config.device_id,
            family = %self,
            actions = actions.len(),
            rendered = action_handlers.len(),
            "analyzed device structure"
        );

        Ok(RemoteDeviceStructure {
            device_id: config.device_id.clone(),
            device_name: config.device_name.clone(),
            device_class: self.tag().to_owned(),
            remote_zones,
            state_interface: state,
            action_handlers,
            special_cases: self.special_cases(&config),
        })
    }
}

fn process_action(
    key: &str,
    command: &crate::model::DeviceCommand,
    overrides: &[IconRule],
) -> ProcessedAction {
    let parameters: Vec<ProcessedParameter> = command
        .parameters()
        .iter()
        .map(ProcessedParameter::from)
        .collect();
    let continuous = parameters.iter().any(ProcessedParameter::is_range);
    let lowered = key.to_lowercase();
    let emphasize =
        lowered.contains("power") || matches!(lowered.as_str(), "play" | "play_pause" | "ok");

    ProcessedAction {
        action_name: key.to_owned(),
        display_name: key.to_title_case(),
        description: command.description.clone(),
        parameters,
        group: command.group_name().unwrap_or(DEFAULT_GROUP).to_owned(),
        location: command.location.clone(),
        icon: icons::select_icon(key, overrides),
        ui_hints: UiHints {
            control: if continuous {
                ControlKind::Slider
            } else {
                ControlKind::Button
            },
            emphasize,
            tooltip: (!command.description.is_empty()).then(|| command.description.clone()),
        },
    }
}

/// One handler per rendered control, in render order.
fn bind_handlers(zones: &[RemoteZone], actions: &[ProcessedAction]) -> Vec<ActionHandler> {
    let by_name: HashMap<&str, &ProcessedAction> = actions
        .iter()
        .map(|a| (a.action_name.as_str(), a))
        .collect();
    zones
        .iter()
        .flat_map(|zone| {
            zone.content.controls().into_iter().map(|control| {
                let action = by_name.get(control.action_name.as_str());
                ActionHandler {
                    action_name: control.action_name.clone(),
                    location: action.map(|a| a.location.clone()).unwrap_or_default(),
                    zone: zone.zone_id,
                    takes_parameters: action.is_some_and(|a| a.has_parameters()),
                }
            })
        })
        .collect()
}

// ── Registry ────────────────────────────────────────────────────────

/// Lookup table from `device_class` tags to families.
#[derive(Debug, Clone)]
pub struct FamilyRegistry {
    by_tag: HashMap<String, DeviceFamily>,
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FamilyRegistry {
    /// Every family under its canonical tag and known aliases.
    pub fn builtin() -> Self {
        let mut registry = Self {
            by_tag: HashMap::new(),
        };
        for family in DeviceFamily::ALL {
            registry.register(family.tag(), family);
            for alias in family.aliases() {
                registry.register(*alias, family);
            }
        }
        registry
    }

    /// Add (or repoint) a tag.
    pub fn register(&mut self, tag: impl Into<String>, family: DeviceFamily) {
        self.by_tag.insert(tag.into().to_lowercase(), family);
    }

    pub fn resolve(&self, device_class: &str) -> Result<DeviceFamily, CoreError> {
        self.by_tag
            .get(device_class.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| CoreError::UnsupportedDeviceClass {
                device_class: device_class.to_owned(),
            })
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
