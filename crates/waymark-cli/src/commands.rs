//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Waymark: environment-aware scenario engine for end-to-end suites
#[derive(Parser, Debug)]
#[command(name = "waymark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Environment identifier (selects `{env}-env.json|yaml`)
    #[arg(short, long, env = "WAYMARK_ENV", default_value = "test", global = true)]
    pub env: String,

    /// Directory holding the environment documents
    #[arg(long, env = "WAYMARK_CONFIG_DIR", default_value = "config", global = true)]
    pub config_dir: PathBuf,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and show the active environment's configuration
    Env(EnvArgs),

    /// Show which scenarios of a manifest register in the active environment
    Plan(PlanArgs),

    /// Generate synthetic test data as JSON lines
    Data(DataArgs),
}

/// Arguments for the env command
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// Print the configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Scenario manifest (YAML)
    pub manifest: PathBuf,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the data command
#[derive(Parser, Debug)]
pub struct DataArgs {
    /// Record kind: first_name, last_name, email, phone, person
    pub kind: String,

    /// Number of records
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum phone number length
    #[arg(long, default_value = "11")]
    pub phone_min: usize,

    /// Maximum phone number length (at most 64)
    #[arg(long, default_value = "21")]
    pub phone_max: usize,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
