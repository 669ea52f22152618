//! JavaScript syntax probe
//!
//! Parsing JavaScript is delegated to an external JS-engine-based checker
//! that prints `SyntaxError` when its stdin does not parse. Spawning it is
//! expensive, so callers only ask after the cheap sniffers are inconclusive.

use crate::config::SyntaxConfig;
use crate::encoding::normalize;
use crate::process::{self, timeout_from_secs};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Marker the checker prints for unparseable input
pub const SYNTAX_ERROR_MARKER: &str = "SyntaxError";

/// Decides whether a source text parses as JavaScript
#[async_trait]
pub trait SyntaxChecker: Send + Sync {
    /// `true` when `source` does not parse
    async fn has_syntax_error(&self, source: &[u8]) -> bool;
}

/// Syntax checker backed by an external process
pub struct ProcessSyntaxChecker {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessSyntaxChecker {
    pub fn new(config: &SyntaxConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: timeout_from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl SyntaxChecker for ProcessSyntaxChecker {
    async fn has_syntax_error(&self, source: &[u8]) -> bool {
        let input = normalize(source);
        match process::run_with_input("syntax", &self.command, &[], &[], &input, self.timeout).await
        {
            Ok(out) => out.combined().contains(SYNTAX_ERROR_MARKER),
            Err(e) => {
                // Unknown counts as unparseable so nothing is rewritten on a guess
                warn!("Syntax check failed: {}", e);
                true
            }
        }
    }
}
