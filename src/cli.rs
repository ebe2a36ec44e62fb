//! CLI definitions for PagePilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PagePilot CLI.
#[derive(Parser)]
#[command(name = "pagepilot")]
#[command(about = "Goal-driven browser action planner")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

pub(crate) const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Generate a plan for a page snapshot and print it as JSON
    Plan {
        /// Page snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// End-user identifier forwarded to the provider
        #[arg(long, env = "PAGEPILOT_USER_ID")]
        user_id: Option<String>,
    },

    /// Print the planner prompt without calling a provider
    Prompt {
        /// Page snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
    },

    /// Print the ranked element buckets with scores
    Rank {
        /// Page snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
    },

    /// Validate the configuration file
    CheckConfig,
}
