//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{ProxyError, ProxyResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "instrument.mode",
    "instrument.use_cache",
    "instrument.cache_dir",
    "instrument.command",
    "instrument.timeout_secs",
    "instrument.html",
    "instrument.javascript",
    "syntax.command",
    "syntax.timeout_secs",
];

/// Execute the config command
pub async fn execute(args: &ConfigArgs, config: &Config, manager: &ConfigManager) -> ProxyResult<()> {
    match &args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, *force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, key, value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ProxyResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> ProxyResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Set one key in the config file; command-line overrides are not saved
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> ProxyResult<()> {
    let ctx = UiContext::detect();
    let mut config = manager.load().await?;

    if let Err(e) = apply_value(&mut config, key, value) {
        ui::step_error_detail(&ctx, "Cannot set config key", &e.to_string());
        ui::remark(&ctx, "Valid keys:");
        for key in VALID_KEYS {
            ui::remark(&ctx, &format!("  {}", key));
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

fn apply_value(config: &mut Config, key: &str, value: &str) -> ProxyResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => config.general.log_format = value.to_string(),

        ["instrument", "mode"] => config.instrument.mode = value.to_string(),
        ["instrument", "use_cache"] => config.instrument.use_cache = parse_bool(value)?,
        ["instrument", "cache_dir"] => config.instrument.cache_dir = PathBuf::from(value),
        ["instrument", "command"] => config.instrument.command = parse_command(value)?,
        ["instrument", "timeout_secs"] => config.instrument.timeout_secs = parse_u64(value)?,
        ["instrument", "html"] => config.instrument.html = parse_bool(value)?,
        ["instrument", "javascript"] => config.instrument.javascript = parse_bool(value)?,

        ["syntax", "command"] => config.syntax.command = parse_command(value)?,
        ["syntax", "timeout_secs"] => config.syntax.timeout_secs = parse_u64(value)?,

        _ => return Err(ProxyError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> ProxyResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ProxyError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> ProxyResult<u64> {
    value
        .parse()
        .map_err(|_| ProxyError::User(format!("Invalid number: {}", value)))
}

/// Whitespace-separated argv
fn parse_command(value: &str) -> ProxyResult<Vec<String>> {
    let argv: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if argv.is_empty() {
        return Err(ProxyError::User("Command must not be empty".to_string()));
    }
    Ok(argv)
}
