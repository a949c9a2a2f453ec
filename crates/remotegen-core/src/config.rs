// ── Runtime generation configuration ──
//
// These types describe *where* generated files go and *how* the external
// tools are invoked. They never touch disk: the CLI loads its TOML config
// and hands these in.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_COMPONENTS_IMPORT: &str = "@/components/remote";
const DEFAULT_HOOKS_IMPORT: &str = "@/state";

/// Options for a single device generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Generation root; every artifact path is relative to it.
    pub output_dir: PathBuf,
    /// Also emit a `use<Device>State` hook per device.
    pub state_hooks: bool,
    /// Also emit `docs/<device_id>.md`.
    pub docs: bool,
    /// Module the rendered components import their building blocks from.
    pub components_import: String,
    /// Module providing `useDeviceState` / `sendDeviceAction`.
    pub hooks_import: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            state_hooks: true,
            docs: false,
            components_import: DEFAULT_COMPONENTS_IMPORT.into(),
            hooks_import: DEFAULT_HOOKS_IMPORT.into(),
        }
    }
}

/// How the schema introspection subprocess is launched.
///
/// The schema reference (`module:Type`) is appended as the last argument.
#[derive(Debug, Clone)]
pub struct IntrospectorConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for IntrospectorConfig {
    fn default() -> Self {
        Self {
            command: "python3".into(),
            args: vec!["-m".into(), "remotegen_introspect".into()],
            timeout: Duration::from_secs(10),
        }
    }
}

/// How the compiler is launched for source validation.
///
/// The file under validation is appended as the last argument.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub compiler: String,
    pub args: Vec<String>,
    /// Globals whose "cannot find name" diagnostics are environment noise.
    pub ignored_globals: Vec<String>,
    pub timeout: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            compiler: "npx".into(),
            args: [
                "tsc",
                "--noEmit",
                "--pretty",
                "false",
                "--jsx",
                "react-jsx",
                "--skipLibCheck",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ignored_globals: ["process", "window", "document", "__DEV__", "require", "module"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout: Duration::from_secs(60),
        }
    }
}
