//! Clap derive structures for the `nbsetup` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this file may
//! only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nbsetup -- provision NetBox from declarative YAML
#[derive(Debug, Parser)]
#[command(
    name = "nbsetup",
    version,
    about = "Provision NetBox objects from declarative YAML input",
    long_about = "Reads a directory of YAML input files and creates the tenants, sites,\n\
        racks, device types, IPAM objects, circuits, clusters and contacts they\n\
        describe. Objects that already exist are left untouched, so runs can be\n\
        repeated safely.",
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
    /// NetBox profile to use
    #[arg(long, short = 'p', env = "NBSETUP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// NetBox URL (overrides profile)
    #[arg(long, env = "NBSETUP_URL", global = true)]
    pub url: Option<String>,

    /// NetBox API token
    #[arg(long, env = "NBSETUP_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NBSETUP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NBSETUP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// When to use color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report failures
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
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
    /// Create the objects described by an input directory
    Run(RunArgs),

    /// Check an input directory without contacting NetBox
    #[command(alias = "check")]
    Validate(ValidateArgs),

    /// Show the stages and the object types each one creates
    Stages,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run ──────────────────────────────────────────────────────────────

/// Stage flags select what to provision; with none set, every stage runs.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory of YAML input files
    pub input_dir: PathBuf,

    /// Tenants, sites, locations, racks
    #[arg(long, short = 'o')]
    pub organisation: bool,

    /// Device roles, manufacturers, platforms, device types
    #[arg(long, short = 'd')]
    pub devices: bool,

    /// RIRs, aggregates, VLANs, VRFs, prefixes
    #[arg(long, short = 'i')]
    pub ipam: bool,

    /// Circuit types, providers, circuits
    #[arg(long, short = 'c')]
    pub circuits: bool,

    /// Cluster groups, cluster types, clusters
    #[arg(long, short = 'V')]
    pub virtualisation: bool,

    /// Contact roles, groups, contacts and their assignments
    #[arg(long, short = 'C')]
    pub contacts: bool,

    /// Directory of device-type template files (overrides profile)
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Exit non-zero when any object failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Directory of YAML input files
    pub input_dir: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (tokens redacted)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's API token in the system keyring
    SetToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
