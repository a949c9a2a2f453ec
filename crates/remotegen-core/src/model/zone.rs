// ── Remote zones ──
//
// The seven fixed semantic regions of a generated remote layout. The
// zone list, names, visibility policy and layouts are closed; only the
// content varies per device.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::{ControlKind, ProcessedAction};

/// Zone identifier. Declaration order is the classifier's tie-break order
/// and the render order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ZoneId {
    Power,
    MediaStack,
    Screen,
    Volume,
    Apps,
    Menu,
    Pointer,
}

/// Content kind a zone holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ZoneType {
    PowerButtons,
    MediaStack,
    ScreenActions,
    VolumeControl,
    AppsDropdown,
    NavigationCluster,
    PointerPad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ZoneLayout {
    Row,
    Stack,
    Grid,
    Column,
    Cluster,
    Pad,
}

impl ZoneId {
    pub const ALL: [Self; 7] = [
        Self::Power,
        Self::MediaStack,
        Self::Screen,
        Self::Volume,
        Self::Apps,
        Self::Menu,
        Self::Pointer,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Power => "Power",
            Self::MediaStack => "Media",
            Self::Screen => "Screen",
            Self::Volume => "Volume",
            Self::Apps => "Apps",
            Self::Menu => "Navigation",
            Self::Pointer => "Pointer",
        }
    }

    pub fn zone_type(self) -> ZoneType {
        match self {
            Self::Power => ZoneType::PowerButtons,
            Self::MediaStack => ZoneType::MediaStack,
            Self::Screen => ZoneType::ScreenActions,
            Self::Volume => ZoneType::VolumeControl,
            Self::Apps => ZoneType::AppsDropdown,
            Self::Menu => ZoneType::NavigationCluster,
            Self::Pointer => ZoneType::PointerPad,
        }
    }

    /// `false` zones are always emitted so layouts line up across devices;
    /// `true` zones disappear when empty.
    pub fn show_hide(self) -> bool {
        !matches!(self, Self::Power | Self::Volume | Self::Menu)
    }

    pub fn layout(self) -> ZoneLayout {
        match self {
            Self::Power => ZoneLayout::Row,
            Self::MediaStack => ZoneLayout::Stack,
            Self::Screen => ZoneLayout::Grid,
            Self::Volume => ZoneLayout::Column,
            Self::Apps => ZoneLayout::Row,
            Self::Menu => ZoneLayout::Cluster,
            Self::Pointer => ZoneLayout::Pad,
        }
    }
}

// ── Zone content building blocks ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderSpec {
    pub parameter: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: Option<f64>,
}

/// One rendered control, referencing its action by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneControl {
    pub action_name: String,
    pub display_name: String,
    pub icon_name: String,
    #[serde(default)]
    pub icon_confidence: f32,
    pub control: ControlKind,
    pub emphasize: bool,
    pub slider: Option<SliderSpec>,
    /// Defaults of the non-range parameters, sent with every trigger.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preset: BTreeMap<String, serde_json::Value>,
}

impl ZoneControl {
    pub fn is_low_confidence(&self) -> bool {
        self.icon_confidence < super::action::LOW_ICON_CONFIDENCE
    }

    pub fn from_action(action: &ProcessedAction) -> Self {
        let slider = action.range_parameter().map(|p| {
            let (min, max) = p.bounds();
            SliderSpec {
                parameter: p.name.clone(),
                min,
                max,
                step: p.slider_step(),
                default: p.default.as_ref().and_then(serde_json::Value::as_f64),
            }
        });
        let preset = action
            .parameters
            .iter()
            .filter(|p| !p.is_range())
            .filter_map(|p| Some((p.name.clone(), p.default.clone()?)))
            .collect();
        Self {
            action_name: action.action_name.clone(),
            display_name: action.display_name.clone(),
            icon_name: action.icon.icon_name.clone(),
            icon_confidence: action.icon.confidence,
            control: if slider.is_some() {
                ControlKind::Slider
            } else {
                ControlKind::Button
            },
            emphasize: action.ui_hints.emphasize,
            slider,
            preset,
        }
    }
}

/// A power key bound to a power domain (`main` unless the family says
/// otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerButton {
    pub domain: String,
    pub control: ZoneControl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum VolumeControl {
    /// A continuous level control; discrete up/down keys are dropped.
    Slider {
        slider: ZoneControl,
        extra: Vec<ZoneControl>,
    },
    /// Discrete keys only (no continuous form on this device).
    Buttons { buttons: Vec<ZoneControl> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationCluster {
    pub up: Option<ZoneControl>,
    pub down: Option<ZoneControl>,
    pub left: Option<ZoneControl>,
    pub right: Option<ZoneControl>,
    pub ok: Option<ZoneControl>,
    pub extra: Vec<ZoneControl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerPad {
    pub move_action: Option<ZoneControl>,
    pub click: Option<ZoneControl>,
    pub scroll: Option<ZoneControl>,
    pub extra: Vec<ZoneControl>,
}

/// Zone payload. At most one variant is ever populated, keyed by the
/// zone's type; `Empty` marks an always-rendered zone with nothing in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ZoneContent {
    Empty,
    PowerButtons {
        buttons: Vec<PowerButton>,
    },
    MediaStack {
        inputs: Vec<ZoneControl>,
        playback: Vec<ZoneControl>,
        tracks: Vec<ZoneControl>,
    },
    ScreenActions {
        actions: Vec<ZoneControl>,
    },
    Volume(VolumeControl),
    AppsDropdown {
        apps: Vec<ZoneControl>,
    },
    NavigationCluster(NavigationCluster),
    PointerPad(PointerPad),
}

impl ZoneContent {
    /// Every control in the content, in render order.
    pub fn controls(&self) -> Vec<&ZoneControl> {
        match self {
            Self::Empty => Vec::new(),
            Self::PowerButtons { buttons } => buttons.iter().map(|b| &b.control).collect(),
            Self::MediaStack {
                inputs,
                playback,
                tracks,
            } => inputs.iter().chain(playback).chain(tracks).collect(),
            Self::ScreenActions { actions } => actions.iter().collect(),
            Self::Volume(VolumeControl::Slider { slider, extra }) => {
                std::iter::once(slider).chain(extra).collect()
            }
            Self::Volume(VolumeControl::Buttons { buttons }) => buttons.iter().collect(),
            Self::AppsDropdown { apps } => apps.iter().collect(),
            Self::NavigationCluster(nav) => [&nav.up, &nav.down, &nav.left, &nav.right, &nav.ok]
                .into_iter()
                .flatten()
                .chain(&nav.extra)
                .collect(),
            Self::PointerPad(pad) => [&pad.move_action, &pad.click, &pad.scroll]
                .into_iter()
                .flatten()
                .chain(&pad.extra)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteZone {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub zone_type: ZoneType,
    pub show_hide: bool,
    pub is_empty: bool,
    pub content: ZoneContent,
    pub layout: ZoneLayout,
}

impl RemoteZone {
    pub fn new(zone_id: ZoneId, content: ZoneContent) -> Self {
        let is_empty = content.controls().is_empty();
        Self {
            zone_id,
            zone_name: zone_id.display_name().to_owned(),
            zone_type: zone_id.zone_type(),
            show_hide: zone_id.show_hide(),
            is_empty,
            content: if is_empty { ZoneContent::Empty } else { content },
            layout: zone_id.layout(),
        }
    }
}
