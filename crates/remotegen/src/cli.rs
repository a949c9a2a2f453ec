//! Clap derive structures for the `remotegen` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// remotegen -- generate remote-control UI pages from device configurations
#[derive(Debug, Parser)]
#[command(
    name = "remotegen",
    version,
    about = "Generate remote-control UI pages from device configurations",
    long_about = "Reads device command descriptions from a local mapping file or a\n\
        configuration service and generates one remote-control page per device,\n\
        plus state hooks, shared schema modules and a router manifest.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (layered over the user and project config)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where device configurations come from (overrides config)
    #[arg(long, global = true)]
    pub source: Option<SourceArg>,

    /// Local device mapping file (overrides config)
    #[arg(long, short = 'm', global = true, value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Configuration service URL (overrides config, implies --source remote)
    #[arg(long, short = 'u', global = true)]
    pub url: Option<String>,

    /// Configuration service bearer token
    #[arg(long, env = "REMOTEGEN_API_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Accept self-signed TLS certificates from the configuration service
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Generation root (overrides config)
    #[arg(long, short = 'd', global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "REMOTEGEN_FORMAT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Mapping file plus one JSON config per device
    Local,
    /// Configuration service over HTTP
    Remote,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate pages for one, several or all devices
    #[command(alias = "gen", alias = "g")]
    Generate(GenerateArgs),

    /// Validate generated sources under the output root
    Validate(ValidateArgs),

    /// Inspect or rebuild the router manifest
    Manifest(ManifestArgs),

    /// List devices and preview their zone layout
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Check that the configuration source is reachable
    Check,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Generate ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Device IDs to generate
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub devices: Vec<String>,

    /// Generate every device the source knows about
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Devices generated concurrently per batch
    #[arg(long, short = 'j', value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Validate each generated page after writing it
    #[arg(long)]
    pub validate: bool,

    /// Also write a Markdown summary per device
    #[arg(long)]
    pub docs: bool,

    /// Skip state hook generation
    #[arg(long)]
    pub no_state_hooks: bool,

    /// Leave the router manifest untouched
    #[arg(long, conflicts_with = "rebuild_manifest")]
    pub no_manifest: bool,

    /// Rebuild the manifest from every page on disk after the run
    #[arg(long)]
    pub rebuild_manifest: bool,

    /// Stop after the first batch containing a failed device
    #[arg(long)]
    pub fail_fast: bool,
}

// ── Validate ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// File or directory to check (default: the output root)
    pub path: Option<PathBuf>,

    /// Only run the structural component checks, not the compiler
    #[arg(long)]
    pub structure_only: bool,
}

// ── Manifest ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ManifestArgs {
    #[command(subcommand)]
    pub command: ManifestCommand,
}

#[derive(Debug, Subcommand)]
pub enum ManifestCommand {
    /// Show the devices registered in the manifest
    #[command(alias = "ls")]
    Show,

    /// Rebuild the manifest from the generated pages on disk
    Rebuild,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices known to the configuration source
    #[command(alias = "ls")]
    List,

    /// Show the zone classification of one device without writing files
    #[command(alias = "get")]
    Show {
        /// Device ID
        device_id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file populated with the defaults
    Init {
        /// Write to this path instead of the user config path
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the user config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
