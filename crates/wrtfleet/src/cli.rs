//! Clap derive structures for the `wrtfleet` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wrtfleet -- manage a fleet of OpenWrt routers over SSH
#[derive(Debug, Parser)]
#[command(
    name = "wrtfleet",
    version,
    about = "Monitor and manage a fleet of OpenWrt routers over SSH",
    long_about = "Polls every configured router over SSH, merges DHCP leases, ARP tables\n\
        and static host bindings across the fleet, and reports who is connected\n\
        where. Alerts on newly joined clients.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "WRTFLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// State file (overrides sync.state_file)
    #[arg(long, env = "WRTFLEET_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WRTFLEET_OUTPUT",
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

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
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
    /// Poll every router once and update status and client lists
    Sync,

    /// Show stored router status; --check polls one router live
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Live diagnostics for one router
    Stats(StatsArgs),

    /// List clients across the fleet
    #[command(alias = "cl")]
    Clients(ClientsArgs),

    /// Give a client a persistent name (empty name clears it)
    Rename(RenameArgs),

    /// Run a shell command on every router
    Exec(ExecArgs),

    /// Reboot one router
    Reboot(RebootArgs),

    /// Sync periodically until interrupted
    Daemon,

    /// List configured routers
    #[command(alias = "r")]
    Routers,

    /// Add a router to the config, check it, and sync the fleet
    Add(AddArgs),

    /// Remove a router from the config and the state file
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Router id; omit to list all routers
    pub router: Option<String>,

    /// Poll the router now instead of showing stored status
    #[arg(long, short = 'c', requires = "router")]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Router id
    pub router: String,
}

#[derive(Debug, Args)]
pub struct ClientsArgs {
    /// Only clients of this router
    #[arg(long, short = 'r')]
    pub router: Option<String>,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Client MAC address
    pub mac: String,

    /// New name
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Command line to run
    pub command: String,

    /// Max concurrent sessions (defaults to sync.command_concurrency)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RebootArgs {
    /// Router id
    pub router: String,

    /// Confirm the reboot
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Router id (its key in the config file)
    pub id: String,

    /// IP address or hostname
    pub address: String,

    /// Display name (defaults to the id)
    #[arg(long)]
    pub name: Option<String>,

    /// SSH port
    #[arg(long, short = 'p', default_value_t = 22)]
    pub port: u16,

    /// SSH user
    #[arg(long, short = 'u', default_value = "root")]
    pub username: String,

    /// DHCP-authoritative gateway
    #[arg(long)]
    pub gateway: bool,

    /// Environment variable holding the SSH password
    #[arg(long, conflicts_with = "key_path")]
    pub password_env: Option<String>,

    /// Private key file (switches to key authentication)
    #[arg(long)]
    pub key_path: Option<PathBuf>,

    /// Do not wait for the follow-up fleet sync
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Router id
    pub id: String,

    /// Confirm the removal
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
