//! Clap derive structures for the `tadolocal` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

use tadolocal_core::HotWaterMode;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tadolocal -- inspect and control climate zones through a local bridge
#[derive(Debug, Parser)]
#[command(
    name = "tadolocal",
    version,
    about = "Inspect and control climate zones through a local Tado bridge",
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
    /// Bridge host or IP address
    #[arg(long, short = 'H', env = "TADOLOCAL_HOST", global = true)]
    pub host: Option<String>,

    /// Bridge port
    #[arg(long, short = 'p', env = "TADOLOCAL_PORT", default_value_t = 4407, global = true)]
    pub port: u16,

    /// Poll interval in seconds (0 disables the periodic poll)
    #[arg(long, env = "TADOLOCAL_INTERVAL", default_value_t = 30, global = true)]
    pub interval: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the bridge answers
    Probe,

    /// List zones with their current state
    #[command(alias = "z")]
    Zones,

    /// List devices
    #[command(alias = "d")]
    Devices,

    /// Follow state changes as they arrive
    #[command(alias = "w")]
    Watch,

    /// Set a standard zone: a target temperature, off, auto, or heat
    Set(SetArgs),

    /// Control a hot-water zone
    #[command(name = "hot-water", alias = "hw")]
    HotWater(HotWaterArgs),
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Zone identifier
    pub zone: String,

    /// `off`, `auto`, `heat`, or a target temperature in °C
    pub setting: String,
}

#[derive(Debug, Args)]
pub struct HotWaterArgs {
    /// Zone identifier
    pub zone: String,

    /// Operation mode
    #[arg(long, value_enum)]
    pub mode: Option<HotWaterModeArg>,

    /// Target temperature in °C
    #[arg(long)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HotWaterModeArg {
    Heat,
    Auto,
    Off,
}

impl From<HotWaterModeArg> for HotWaterMode {
    fn from(arg: HotWaterModeArg) -> Self {
        match arg {
            HotWaterModeArg::Heat => Self::Heat,
            HotWaterModeArg::Auto => Self::Auto,
            HotWaterModeArg::Off => Self::Off,
        }
    }
}
