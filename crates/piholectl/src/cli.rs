//! Clap derive structures for the `piholectl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// piholectl -- manage Pi-hole local DNS from the command line
#[derive(Debug, Parser)]
#[command(
    name = "piholectl",
    version,
    about = "Manage Pi-hole local DNS, CNAME and client records",
    long_about = "Manage a Pi-hole appliance's local DNS host records, CNAME records\n\
        and client definitions through its v6 configuration API.\n\n\
        Every change is serialized, so scripted replace sequences never\n\
        interleave with one another.",
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
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "PIHOLE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance URL (overrides profile and PIHOLE_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept any TLS certificate
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// PEM file with extra CA certificates
    #[arg(long, global = true)]
    pub ca_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Give up on the whole operation after this many seconds
    #[arg(long, global = true)]
    pub deadline: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage local DNS host records (domain -> IP)
    Dns(DnsArgs),

    /// Manage local CNAME records (domain -> target)
    Cname(CnameArgs),

    /// Manage client definitions
    #[command(alias = "cl")]
    Clients(ClientsArgs),

    /// Inspect or end the appliance session
    Session(SessionArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── DNS ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DnsArgs {
    #[command(subcommand)]
    pub command: DnsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DnsCommand {
    /// List local DNS records
    #[command(alias = "ls")]
    List,

    /// Show the record for a domain
    Get { domain: String },

    /// Create a record
    Create {
        domain: String,
        ip: String,
        /// Replace an existing mapping for the domain
        #[arg(long)]
        force: bool,
    },

    /// Delete the record for a domain (succeeds if absent)
    #[command(alias = "rm")]
    Delete { domain: String },

    /// Point a domain at a new IP in one uninterrupted step
    Replace { domain: String, ip: String },
}

// ── CNAME ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CnameArgs {
    #[command(subcommand)]
    pub command: CnameCommand,
}

#[derive(Debug, Subcommand)]
pub enum CnameCommand {
    /// List local CNAME records
    #[command(alias = "ls")]
    List,

    /// Show the record for a domain
    Get { domain: String },

    /// Create a record
    Create {
        domain: String,
        target: String,
        /// Ask the appliance to override a conflicting entry
        #[arg(long)]
        force: bool,
    },

    /// Delete the record for a domain (succeeds if absent)
    #[command(alias = "rm")]
    Delete { domain: String },

    /// Point a domain at a new target in one uninterrupted step
    Replace { domain: String, target: String },
}

// ── Clients ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClientsArgs {
    #[command(subcommand)]
    pub command: ClientsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    /// List client definitions
    #[command(alias = "ls")]
    List,

    /// Show one client (IP, MAC, hostname, CIDR or interface)
    Get { client: String },

    /// Define a client
    Create {
        client: String,
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Change a client's comment
    Update {
        client: String,
        #[arg(long)]
        comment: String,
    },

    /// Remove a client definition
    #[command(alias = "rm")]
    Delete { client: String },
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Print a session id and leave it open, for export as __PIHOLE_SESSION_ID
    Id,

    /// End the current session on the appliance
    Logout,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the resolved configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Store a profile's password in the system keyring
    SetPassword,

    /// List configured profiles
    Profiles,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
