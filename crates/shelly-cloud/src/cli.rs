//! Clap derive structures for the `shelly-cloud` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// shelly-cloud -- poll and switch Shelly devices through Shelly Cloud
#[derive(Debug, Parser)]
#[command(
    name = "shelly-cloud",
    version,
    about = "Poll and switch Shelly devices through Shelly Cloud",
    long_about = "Talks to the Shelly Cloud REST API on behalf of one account.\n\n\
        Lists devices, reads relay and sensor status, switches relays, and\n\
        can run the polling bridge in the foreground with `watch`.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "SHELLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Shelly Cloud account e-mail (overrides profile)
    #[arg(long, short = 'u', env = "SHELLY_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHELLY_OUTPUT",
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

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SHELLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

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
    /// List devices registered to the account
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// Show relay and sensor status
    #[command(alias = "st")]
    Status(StatusArgs),

    /// List every switch and sensor entity with its state
    #[command(alias = "ent")]
    Entities,

    /// Switch a relay channel on or off
    #[command(alias = "sw")]
    Switch(SwitchArgs),

    /// Run the polling bridge and print changes until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS / SWITCH / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Device ID (all devices when omitted)
    pub device: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SwitchState {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Device ID
    pub device: String,

    /// Requested relay state
    pub state: SwitchState,

    /// Relay channel (0-based)
    #[arg(long, short = 'c', default_value = "0")]
    pub channel: u32,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Status poll period, e.g. "10s" (overrides profile)
    #[arg(long, value_parser = parse_interval)]
    pub status_interval: Option<Duration>,

    /// Device-list poll period, e.g. "15m" (overrides profile)
    #[arg(long, value_parser = parse_interval)]
    pub discovery_interval: Option<Duration>,
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if duration.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(duration)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
