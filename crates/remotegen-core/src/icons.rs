// ── Icon selection ──
//
// Ranked rule table mapping action names to icon names. Exact rules are
// tried before substring rules, family overrides before the shared table,
// and the first match wins. Unmatched actions get the `Help` icon with a
// confidence low enough to be flagged for manual review.

use crate::model::ActionIcon;

pub const ICON_LIBRARY: &str = "material";
pub const ICON_VARIANT: &str = "filled";
pub const FALLBACK_ICON: &str = "Help";

const FALLBACK_CONFIDENCE: f32 = 0.1;
const EXACT_CONFIDENCE: f32 = 0.95;
const CONTAINS_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconMatch {
    /// Whole action name, case-insensitive.
    Exact,
    /// Pattern occurs anywhere in the action name, case-insensitive.
    Contains,
}

#[derive(Debug, Clone, Copy)]
pub struct IconRule {
    pub pattern: &'static str,
    pub matcher: IconMatch,
    pub icon: &'static str,
}

impl IconRule {
    pub const fn exact(pattern: &'static str, icon: &'static str) -> Self {
        Self {
            pattern,
            matcher: IconMatch::Exact,
            icon,
        }
    }

    pub const fn contains(pattern: &'static str, icon: &'static str) -> Self {
        Self {
            pattern,
            matcher: IconMatch::Contains,
            icon,
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self.matcher {
            IconMatch::Exact => name == self.pattern,
            IconMatch::Contains => name.contains(self.pattern),
        }
    }

    fn confidence(&self) -> f32 {
        match self.matcher {
            IconMatch::Exact => EXACT_CONFIDENCE,
            IconMatch::Contains => CONTAINS_CONFIDENCE,
        }
    }
}

/// Shared table. Order matters within each matcher kind.
pub static ICON_RULES: &[IconRule] = &[
    // ── Exact ──
    IconRule::exact("power", "PowerSettingsNew"),
    IconRule::exact("power_on", "Power"),
    IconRule::exact("power_off", "PowerOff"),
    IconRule::exact("power_toggle", "PowerSettingsNew"),
    IconRule::exact("standby", "ModeStandby"),
    IconRule::exact("mute", "VolumeOff"),
    IconRule::exact("volume_up", "VolumeUp"),
    IconRule::exact("volume_down", "VolumeDown"),
    IconRule::exact("set_volume", "VolumeUp"),
    IconRule::exact("play", "PlayArrow"),
    IconRule::exact("pause", "Pause"),
    IconRule::exact("play_pause", "PlayArrow"),
    IconRule::exact("stop", "Stop"),
    IconRule::exact("next", "SkipNext"),
    IconRule::exact("previous", "SkipPrevious"),
    IconRule::exact("rewind", "FastRewind"),
    IconRule::exact("fast_forward", "FastForward"),
    IconRule::exact("up", "KeyboardArrowUp"),
    IconRule::exact("down", "KeyboardArrowDown"),
    IconRule::exact("left", "KeyboardArrowLeft"),
    IconRule::exact("right", "KeyboardArrowRight"),
    IconRule::exact("ok", "RadioButtonChecked"),
    IconRule::exact("enter", "RadioButtonChecked"),
    IconRule::exact("select", "RadioButtonChecked"),
    IconRule::exact("back", "ArrowBack"),
    IconRule::exact("home", "Home"),
    IconRule::exact("menu", "Menu"),
    IconRule::exact("exit", "ExitToApp"),
    IconRule::exact("settings", "Settings"),
    IconRule::exact("info", "Info"),
    IconRule::exact("guide", "ListAlt"),
    IconRule::exact("click", "AdsClick"),
    // ── Substring ──
    IconRule::contains("power_off", "PowerOff"),
    IconRule::contains("turn_off", "PowerOff"),
    IconRule::contains("power", "Power"),
    IconRule::contains("mute", "VolumeOff"),
    IconRule::contains("volume_up", "VolumeUp"),
    IconRule::contains("volume_down", "VolumeDown"),
    IconRule::contains("volume", "VolumeUp"),
    IconRule::contains("input", "Input"),
    IconRule::contains("source", "Input"),
    IconRule::contains("hdmi", "SettingsInputHdmi"),
    IconRule::contains("aspect", "AspectRatio"),
    IconRule::contains("zoom", "ZoomIn"),
    IconRule::contains("subtitle", "Subtitles"),
    IconRule::contains("picture", "Tv"),
    IconRule::contains("netflix", "Movie"),
    IconRule::contains("youtube", "SmartDisplay"),
    IconRule::contains("app", "Apps"),
    IconRule::contains("cursor", "Mouse"),
    IconRule::contains("pointer", "Mouse"),
    IconRule::contains("mouse", "Mouse"),
    IconRule::contains("scroll", "SwapVert"),
    IconRule::contains("click", "AdsClick"),
    IconRule::contains("next", "SkipNext"),
    IconRule::contains("prev", "SkipPrevious"),
    IconRule::contains("play", "PlayArrow"),
    IconRule::contains("pause", "Pause"),
    IconRule::contains("light", "Lightbulb"),
    IconRule::contains("fan", "Air"),
    IconRule::contains("speed", "Speed"),
    IconRule::contains("menu", "Menu"),
];

/// Pick an icon for an action name.
///
/// `overrides` is consulted first, exact rules before substring rules in
/// both tables.
pub fn select_icon(action_name: &str, overrides: &[IconRule]) -> ActionIcon {
    let name = action_name.to_lowercase();
    let ranked = [IconMatch::Exact, IconMatch::Contains];

    let hit = ranked.iter().find_map(|kind| {
        overrides
            .iter()
            .chain(ICON_RULES)
            .filter(|r| r.matcher == *kind)
            .find(|r| r.matches(&name))
    });

    match hit {
        Some(rule) => icon(rule.icon, rule.confidence()),
        None => icon(FALLBACK_ICON, FALLBACK_CONFIDENCE),
    }
}

fn icon(name: &str, confidence: f32) -> ActionIcon {
    ActionIcon {
        icon_library: ICON_LIBRARY.into(),
        icon_name: name.into(),
        icon_variant: ICON_VARIANT.into(),
        fallback_icon: FALLBACK_ICON.into(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_beats_substring() {
        let icon = select_icon("power_off", &[]);
        assert_eq!(icon.icon_name, "PowerOff");
        assert!((icon.confidence - EXACT_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let icon = select_icon("Launch_Netflix", &[]);
        assert_eq!(icon.icon_name, "Movie");
        assert!(!icon.is_low_confidence());
    }

    #[test]
    fn unmatched_falls_back_to_help() {
        let icon = select_icon("defrost_cycle", &[]);
        assert_eq!(icon.icon_name, FALLBACK_ICON);
        assert!(icon.is_low_confidence());
    }

    #[test]
    fn overrides_take_precedence() {
        const OVERRIDES: &[IconRule] = &[IconRule::exact("power", "Speaker")];
        assert_eq!(select_icon("power", OVERRIDES).icon_name, "Speaker");
        assert_eq!(select_icon("power", &[]).icon_name, "PowerSettingsNew");
    }

    #[test]
    fn exact_shared_rule_beats_substring_override() {
        const OVERRIDES: &[IconRule] = &[IconRule::contains("mu", "Speaker")];
        assert_eq!(select_icon("mute", OVERRIDES).icon_name, "VolumeOff");
    }
}
