//! Instrumentation tool invocation
//!
//! The tool reads source on stdin and writes the instrumented artifact to
//! the path given with `--o`:
//!
//! ```text
//! <command...> --kind {html|js} --o <output>
//! ```
//!
//! with `INITRACER_MODE` and `INITRACER_URL` added to its environment.

use super::key::ArtifactKind;
use crate::config::InstrumentConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::process::{self, display_command, timeout_from_secs};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable carrying the operating mode
pub const MODE_ENV: &str = "INITRACER_MODE";

/// Environment variable carrying the flow's original URL
pub const URL_ENV: &str = "INITRACER_URL";

/// Max characters of tool output kept in error messages
const ERROR_OUTPUT_CHARS: usize = 2000;

/// One instrumentation request
#[derive(Debug, Clone, Copy)]
pub struct InstrumentJob<'a> {
    pub kind: ArtifactKind,
    /// Normalized (UTF-8) source
    pub source: &'a [u8],
    /// Where the tool must write its artifact
    pub output: &'a Path,
    pub mode: &'a str,
    pub url: &'a str,
}

/// Produces an instrumented artifact for a source text
#[async_trait]
pub trait Instrumenter: Send + Sync {
    /// Write the instrumented form of `job.source` to `job.output`
    async fn instrument(&self, job: &InstrumentJob<'_>) -> ProxyResult<()>;
}

/// Instrumenter backed by the external instrumentation tool
pub struct ProcessInstrumenter {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessInstrumenter {
    pub fn new(config: &InstrumentConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: timeout_from_secs(config.timeout_secs),
        }
    }

    fn args(job: &InstrumentJob<'_>) -> Vec<String> {
        vec![
            "--kind".to_string(),
            job.kind.ext().to_string(),
            "--o".to_string(),
            job.output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Instrumenter for ProcessInstrumenter {
    async fn instrument(&self, job: &InstrumentJob<'_>) -> ProxyResult<()> {
        let args = Self::args(job);
        let env = [(MODE_ENV, job.mode), (URL_ENV, job.url)];

        let out = process::run_with_input(
            "instrument",
            &self.command,
            &args,
            &env,
            job.source,
            self.timeout,
        )
        .await?;

        let output = out.combined();
        if !out.success() {
            return Err(ProxyError::ToolExit {
                command: display_command(&self.command, &args),
                code: out.status.code(),
                output: output.chars().take(ERROR_OUTPUT_CHARS).collect(),
            });
        }

        if !output.trim().is_empty() {
            debug!("instrument: {}", output.trim_end());
        }
        Ok(())
    }
}
