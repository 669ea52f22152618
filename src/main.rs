//! initracer-proxy - response rewriting for an instrumenting MITM proxy
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use initracer_proxy::cli::args::LogFormat;
use initracer_proxy::cli::{Cli, Commands};
use initracer_proxy::config::{Config, ConfigManager};
use initracer_proxy::error::ProxyResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ProxyResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Path and init must keep working when the file itself is broken
    if let Commands::Config(ref args) = cli.command {
        if !args.reads_config() {
            init_logging(&cli, &Config::default());
            return initracer_proxy::cli::commands::config(args, &Config::default(), &manager)
                .await;
        }
    }

    let mut config = manager.load().await?;
    apply_overrides(&cli, &mut config);

    init_logging(&cli, &config);

    match cli.command {
        Commands::Rewrite(args) => initracer_proxy::cli::commands::rewrite(args, &config).await,
        Commands::Classify(args) => initracer_proxy::cli::commands::classify(args, &config).await,
        Commands::Cache(args) => initracer_proxy::cli::commands::cache(args, &config).await,
        Commands::Config(ref args) => {
            initracer_proxy::cli::commands::config(args, &config, &manager).await
        }
    }
}

/// Command-line flags win over the config file
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if cli.cache {
        config.instrument.use_cache = true;
    }
    if let Some(ref mode) = cli.mode {
        config.instrument.mode = mode.clone();
    }
    if let Some(ref dir) = cli.cache_dir {
        config.instrument.cache_dir = dir.clone();
    }
}

// 0 = warn, 1 = info, 2+ = debug
fn init_logging(cli: &Cli, config: &Config) {
    let verbose = match cli.verbose {
        0 if config.general.verbose => 1,
        n => n,
    };
    let filter = match verbose {
        0 => EnvFilter::new("initracer_proxy=warn"),
        1 => EnvFilter::new("initracer_proxy=info"),
        _ => EnvFilter::new("initracer_proxy=debug"),
    };

    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.general.log_format));

    // Diagnostics go to stderr; stdout carries command output
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}
