//! CLI parse: clap types for taleweaver. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taleweaver CLI - long-form campaign stories from session notes
#[derive(Parser)]
#[command(name = "taleweaver")]
#[command(about = "Plan and write long-form campaign stories with parallel section writers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan and write a full story
    Generate {
        /// Notes file (looked up under the notes directory if not found as given)
        #[arg(long)]
        notes: PathBuf,
        /// Reference page to load (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,
        /// Output file (default: <output_dir>/campaign_<timestamp>.md)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Read the structure template from a file
        #[arg(long)]
        structure_file: Option<PathBuf>,
        /// Config override for this run, e.g. provider.model=gpt-4o (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// Maximum concurrent section writers per wave
        #[arg(long)]
        max_parallel: Option<usize>,
    },
    /// Generate and show the story plan without writing sections
    Plan {
        /// Notes file
        #[arg(long)]
        notes: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Config override for this run (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (secrets redacted)
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
        /// Config override to preview (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
}
