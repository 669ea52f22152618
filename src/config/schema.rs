//! Configuration schema for initracer-proxy
//!
//! Configuration is stored at `~/.config/initracer-proxy/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Instrumentation tool and cache settings
    pub instrument: InstrumentConfig,

    /// JavaScript syntax probe settings
    pub syntax: SyntaxConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Instrumentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Operating mode handed to the instrumentation tool
    pub mode: String,

    /// Reuse instrumented artifacts already present in the cache
    pub use_cache: bool,

    /// Root of the on-disk cache (`<cache_dir>/<host>/<hash>/`)
    pub cache_dir: PathBuf,

    /// Instrumentation tool argv prefix; `--kind <kind> --o <path>` is appended
    pub command: Vec<String>,

    /// Kill the tool after this many seconds (0 = wait forever)
    pub timeout_secs: u64,

    /// Instrument HTML documents
    pub html: bool,

    /// Instrument JavaScript
    pub javascript: bool,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            mode: "observation".to_string(),
            use_cache: false,
            cache_dir: PathBuf::from("cache"),
            command: vec!["node".to_string(), "src/instrument.js".to_string()],
            timeout_secs: 120,
            html: true,
            javascript: true,
        }
    }
}

/// Syntax probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Syntax checker argv; prints `SyntaxError` when the input does not parse
    pub command: Vec<String>,

    /// Kill the checker after this many seconds (0 = wait forever)
    pub timeout_secs: u64,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            command: vec!["node".to_string(), "mitmproxy/parse-js.js".to_string()],
            timeout_secs: 30,
        }
    }
}
