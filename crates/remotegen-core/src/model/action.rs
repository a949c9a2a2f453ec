// ── Processed actions ──
//
// A `DeviceCommand` after a family strategy has decorated it with a
// display name, an icon choice and rendering hints.

use serde::{Deserialize, Serialize};

use super::command::{CommandParameter, ParameterType};

const DEFAULT_RANGE_MIN: f64 = 0.0;
const DEFAULT_RANGE_MAX: f64 = 100.0;

/// Icon choices below this confidence are flagged for manual review.
pub const LOW_ICON_CONFIDENCE: f32 = 0.5;

/// Icon chosen for an action by the icon rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIcon {
    pub icon_library: String,
    pub icon_name: String,
    pub icon_variant: String,
    pub fallback_icon: String,
    /// How certain the selection heuristic was, in `[0, 1]`. Informational.
    pub confidence: f32,
}

impl ActionIcon {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_ICON_CONFIDENCE
    }
}

/// How an action is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ControlKind {
    Button,
    Slider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiHints {
    pub control: ControlKind,
    /// Rendered with a stronger accent (power and primary transport keys).
    pub emphasize: bool,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedParameter {
    pub name: String,
    pub param_type: ParameterType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub description: String,
}

impl ProcessedParameter {
    pub fn is_range(&self) -> bool {
        self.param_type == ParameterType::Range
    }

    /// Slider bounds, defaulting to `0..=100`.
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.min.unwrap_or(DEFAULT_RANGE_MIN),
            self.max.unwrap_or(DEFAULT_RANGE_MAX),
        )
    }

    /// Step heuristic: 1 for spans up to 10, 5 up to 100, 10 beyond.
    pub fn slider_step(&self) -> f64 {
        let (min, max) = self.bounds();
        let span = (max - min).abs();
        if span <= 10.0 {
            1.0
        } else if span <= 100.0 {
            5.0
        } else {
            10.0
        }
    }
}

impl From<&CommandParameter> for ProcessedParameter {
    fn from(p: &CommandParameter) -> Self {
        Self {
            name: p.name.clone(),
            param_type: p.param_type,
            required: p.required,
            default: p.default.clone(),
            min: p.min,
            max: p.max,
            description: p.description.clone(),
        }
    }
}

/// A command ready for zone classification and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedAction {
    /// Command key; unique within a device.
    pub action_name: String,
    pub display_name: String,
    pub description: String,
    pub parameters: Vec<ProcessedParameter>,
    /// Effective group id (`default` when ungrouped).
    pub group: String,
    /// Copied verbatim from the command's `location`.
    pub location: String,
    pub icon: ActionIcon,
    pub ui_hints: UiHints,
}

impl ProcessedAction {
    pub fn range_parameter(&self) -> Option<&ProcessedParameter> {
        self.parameters.iter().find(|p| p.is_range())
    }

    pub fn is_continuous(&self) -> bool {
        self.range_parameter().is_some()
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
}
