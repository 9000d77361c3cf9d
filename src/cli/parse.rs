//! CLI parse: clap types for Vitrine. No behavior; definitions only.

use crate::marquee::SpeedTier;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vitrine CLI - prompt-driven imagery with bounded retries
#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Generate prompt-driven imagery and compose looping strips")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one image and wait for it to load or fail
    Generate {
        /// Prompt text
        prompt: String,
        /// Write the decoded image to this file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Mount a looping strip and report every slot once settled
    Strip {
        /// Prompt for the strip; repeat for each item
        #[arg(long = "prompt", required = true)]
        prompts: Vec<String>,
        /// Speed tier (slow or normal)
        #[arg(long, default_value = "normal")]
        speed: SpeedTier,
        /// Scroll in reverse
        #[arg(long)]
        reverse: bool,
        /// Share one request sequence between slots with the same prompt
        #[arg(long)]
        shared: bool,
        /// Give up waiting after this many seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration (credential redacted)
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the merged configuration
    Validate,
}

impl Commands {
    /// Stable command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Strip { .. } => "strip",
            Commands::Config {
                command: ConfigCommands::Show { .. },
            } => "config show",
            Commands::Config {
                command: ConfigCommands::Validate,
            } => "config validate",
        }
    }
}
