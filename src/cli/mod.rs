//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::selection::SelectionOverride;

pub mod commands;

/// Rage - mirror a remote document database to a local JSON tree
#[derive(Parser, Debug)]
#[command(name = "rage", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.rage/config.json)
    #[arg(long, global = true, env = "RAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror root directory (overrides outDir)
    #[arg(long, global = true, env = "RAGE_MIRROR")]
    pub mirror: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mirror the remote databases into the local tree
    Pull(SelectionArgs),

    /// Replace remote collections with the local mirror files
    Push(SelectionArgs),

    /// Show what the mirror tree contains
    Status,

    /// Pull repeatedly until interrupted
    Watch {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Milliseconds between pulls (overrides methodSpecificSettings.interval)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Per-run overrides of the persisted selection.
///
/// Blank values fall back to the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Connection secret (e.g. a MongoDB connection string)
    #[arg(long, env = "RAGE_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Databases to synchronize, comma-separated
    #[arg(long)]
    pub dbs: Option<String>,

    /// Collection names to skip, comma-separated
    #[arg(long)]
    pub exclude: Option<String>,
}

impl SelectionArgs {
    /// Convert the flags into an override, or `None` if no flag was given.
    #[must_use]
    pub fn to_override(&self) -> Option<SelectionOverride> {
        let over = SelectionOverride {
            secret: self.secret.clone().unwrap_or_default(),
            databases: self.dbs.clone().unwrap_or_default(),
            excluded_collections: self.exclude.clone().unwrap_or_default(),
        };
        (!over.is_empty()).then_some(over)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
