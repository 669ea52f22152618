//! Cache command - inspect instrumented artifacts

use crate::cache::{list_entries, CacheEntry};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::ProxyResult;
use console::style;
use std::path::Path;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ProxyResult<()> {
    let root = &config.instrument.cache_dir;

    match args.action {
        CacheAction::List { format } => list_cache(root, format).await,
        CacheAction::Path => {
            println!("{}", root.display());
            Ok(())
        }
    }
}

/// List every cached artifact
async fn list_cache(root: &Path, format: OutputFormat) -> ProxyResult<()> {
    let entries = list_entries(root).await?;

    if entries.is_empty() && format != OutputFormat::Json {
        println!("No cached artifacts under {}.", root.display());
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_cache_table(&entries),
        OutputFormat::Json => print_cache_json(&entries)?,
        OutputFormat::Plain => print_cache_plain(&entries),
    }

    Ok(())
}

fn file_name(entry: &CacheEntry) -> String {
    entry
        .artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_cache_table(entries: &[CacheEntry]) {
    println!(
        "{:<28} {:<34} {:<24} {:<12} {:<17}",
        "HOST", "HASH", "ARTIFACT", "MODE", "CREATED"
    );
    println!("{}", "-".repeat(118));

    for entry in entries {
        let (mode, created) = match &entry.meta {
            Some(meta) => (
                meta.mode.clone(),
                meta.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ),
            None => (style("-").dim().to_string(), style("-").dim().to_string()),
        };

        println!(
            "{:<28} {:<34} {:<24} {:<12} {:<17}",
            entry.host,
            entry.hash,
            file_name(entry),
            mode,
            created
        );
    }

    println!();
    println!("Total: {} artifact(s)", entries.len());
}

fn print_cache_json(entries: &[CacheEntry]) -> ProxyResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson {
        host: String,
        hash: String,
        artifact: String,
        url: Option<String>,
        kind: Option<String>,
        mode: Option<String>,
        created_at: Option<String>,
    }

    let json_entries: Vec<EntryJson> = entries
        .iter()
        .map(|e| EntryJson {
            host: e.host.clone(),
            hash: e.hash.clone(),
            artifact: e.artifact.display().to_string(),
            url: e.meta.as_ref().map(|m| m.url.clone()),
            kind: e.meta.as_ref().map(|m| m.kind.clone()),
            mode: e.meta.as_ref().map(|m| m.mode.clone()),
            created_at: e.meta.as_ref().map(|m| m.created_at.to_rfc3339()),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_entries)?);
    Ok(())
}

fn print_cache_plain(entries: &[CacheEntry]) {
    for entry in entries {
        println!("{}", entry.artifact.display());
    }
}
