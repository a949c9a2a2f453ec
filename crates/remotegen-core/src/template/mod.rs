// ── Template generator ──
//
// Renders device structures into TypeScript/TSX source text. Output is
// byte-deterministic: the same structure always produces the same bytes
// (no timestamps, ordered collections only).

mod component;
mod state;

use crate::config::GeneratorConfig;

pub(crate) const HEADER: &str = "// Generated by remotegen. Do not edit by hand.";

/// Marks the schema reference a shared module was rendered from.
pub(crate) const SOURCE_SCHEMA_PREFIX: &str = "// Source schema: ";

/// Renders component, state hook and shared schema sources.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    components_import: String,
    hooks_import: String,
    state_hooks: bool,
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl TemplateGenerator {
    pub fn new(components_import: impl Into<String>, hooks_import: impl Into<String>) -> Self {
        Self {
            components_import: components_import.into(),
            hooks_import: hooks_import.into(),
            state_hooks: true,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            state_hooks: config.state_hooks,
            ..Self::new(&config.components_import, &config.hooks_import)
        }
    }

    /// Whether rendered components read state through a generated hook.
    pub fn with_state_hooks(mut self, enabled: bool) -> Self {
        self.state_hooks = enabled;
        self
    }
}

// ── Source buffer ───────────────────────────────────────────────────

/// Line-oriented source builder with two-space indentation.
#[derive(Default)]
pub(crate) struct Code {
    buf: String,
}

impl Code {
    pub(crate) fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

// ── TypeScript literal helpers ──────────────────────────────────────

/// Double-quoted string literal, escaped.
pub(crate) fn ts_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// Property key: bare when it is a valid identifier, quoted otherwise.
pub(crate) fn ts_key(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if bare { name.to_owned() } else { ts_string(name) }
}

/// Number literal without a trailing `.0` for whole values.
pub(crate) fn ts_number(value: f64) -> String {
    format!("{value}")
}
