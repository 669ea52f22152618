//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// initracer-proxy - response rewriting for an instrumenting MITM proxy
///
/// Replays recorded flows through the proxy hooks, classifies bodies and
/// manages the instrumentation cache.
#[derive(Parser, Debug)]
#[command(name = "initracer-proxy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "INITRACER_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reuse cached instrumentation artifacts
    #[arg(long, global = true)]
    pub cache: bool,

    /// Instrumentation mode passed to the tool
    #[arg(short, long, global = true)]
    pub mode: Option<String>,

    /// Cache root directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run recorded flows through the request and response hooks
    Rewrite(RewriteArgs),

    /// Classify a body the way the response pass would
    Classify(ClassifyArgs),

    /// Inspect the instrumentation cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the rewrite command
#[derive(Parser, Debug)]
pub struct RewriteArgs {
    /// Flow files (JSON)
    #[arg(required = true)]
    pub flows: Vec<PathBuf>,

    /// Maximum number of flows rewritten at once
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Write each rewritten flow into this directory instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Body to classify
    pub file: PathBuf,

    /// Declared Content-Type
    #[arg(short = 't', long)]
    pub content_type: Option<String>,

    /// URL reported in warnings
    #[arg(short, long, default_value = "file://classify")]
    pub url: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

impl ConfigArgs {
    /// Whether the action needs the current configuration loaded
    pub fn reads_config(&self) -> bool {
        !matches!(
            self.action,
            Some(ConfigAction::Path) | Some(ConfigAction::Init { .. })
        )
    }
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., instrument.mode)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for list-style commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse `general.log_format`; anything unrecognized is text
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached artifacts
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the cache root directory
    Path,
}
