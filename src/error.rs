//! Error types for initracer-proxy
//!
//! All modules use `ProxyResult<T>` as their return type. None of these
//! errors ever escape a flow hook; they are contained to the response pass
//! that produced them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// All errors that can occur while rewriting flows
#[derive(Error, Debug)]
pub enum ProxyError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty command configured for {0}")]
    EmptyCommand(&'static str),

    // Flow errors
    #[error("Failed to decode response body ({encoding}): {reason}")]
    Decode { encoding: String, reason: String },

    #[error("Flow has no response")]
    NoResponse,

    #[error("Invalid flow {path}: {reason}")]
    InvalidFlow { path: PathBuf, reason: String },

    // External tool errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with {}: {command}: {output}", code.map_or_else(|| "signal".to_string(), |c| format!("code {}", c)))]
    ToolExit {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Command timed out after {secs}s: {command}")]
    ToolTimeout { command: String, secs: u64 },

    #[error("Instrumentation produced no artifact at {0}")]
    MissingArtifact(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandFailed { .. } => {
                Some("Check the `command` entries under [instrument] and [syntax] in the config")
            }
            Self::EmptyCommand(_) => Some("Set a non-empty command array in the config"),
            Self::ToolTimeout { .. } => Some("Raise `timeout_secs`, or set it to 0 to disable"),
            Self::ConfigInvalid { .. } => {
                Some("Fix the file, or recreate it with: initracer-proxy config init --force")
            }
            _ => None,
        }
    }
}
