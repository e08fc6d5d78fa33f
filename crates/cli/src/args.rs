//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// room-watch: notify a Telegram chat about newly published housing listings
#[derive(Parser, Debug)]
#[command(name = "room-watch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll for new listings and notify the chat
    Run(RunArgs),

    /// Inspect the record of already-notified listings
    Seen(SeenArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Write notifications to the outbox file instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Path to outbox file (used with --dry-run)
    #[arg(long)]
    pub outbox: Option<PathBuf>,

    /// Do not answer messages sent to the bot
    #[arg(long)]
    pub no_echo: bool,

    /// Keep the seen-set in memory only
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Args, Debug)]
pub struct SeenArgs {
    #[command(subcommand)]
    pub command: SeenCommands,
}

#[derive(Subcommand, Debug)]
pub enum SeenCommands {
    /// List recorded listing identifiers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the number of recorded identifiers
    Count,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
