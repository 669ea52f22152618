//! In-process stand-ins for the external tools, for unit tests

use crate::cache::{InstrumentJob, Instrumenter};
use crate::classify::sniff::trim;
use crate::classify::SyntaxChecker;
use crate::error::{ProxyError, ProxyResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Accepts anything empty or ending in `;`, `}` or `)` as JavaScript
#[derive(Default)]
pub struct FakeSyntax {
    calls: AtomicUsize,
}

impl FakeSyntax {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyntaxChecker for FakeSyntax {
    async fn has_syntax_error(&self, source: &[u8]) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let source = trim(source);
        !(source.is_empty() || matches!(source.last(), Some(b';' | b'}' | b')')))
    }
}

#[derive(Default, Clone, Copy)]
enum Behaviour {
    #[default]
    Write,
    Fail,
    Silent,
}

/// Writes `/* <ext> */` followed by the source as the artifact
#[derive(Default)]
pub struct FakeInstrumenter {
    behaviour: Behaviour,
    calls: AtomicUsize,
    sources: Mutex<Vec<Vec<u8>>>,
    contexts: Mutex<Vec<(String, String)>>,
}

impl FakeInstrumenter {
    /// Exits non-zero without writing anything
    pub fn failing() -> Self {
        Self {
            behaviour: Behaviour::Fail,
            ..Self::default()
        }
    }

    /// Exits zero without writing anything
    pub fn silent() -> Self {
        Self {
            behaviour: Behaviour::Silent,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<Vec<u8>> {
        self.sources.lock().unwrap().clone()
    }

    /// `(mode, url)` seen by each call
    pub fn contexts(&self) -> Vec<(String, String)> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Instrumenter for FakeInstrumenter {
    async fn instrument(&self, job: &InstrumentJob<'_>) -> ProxyResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(job.source.to_vec());
        self.contexts
            .lock()
            .unwrap()
            .push((job.mode.to_string(), job.url.to_string()));

        match self.behaviour {
            Behaviour::Write => {
                let mut out = format!("/* {} */", job.kind.ext()).into_bytes();
                out.extend_from_slice(job.source);
                tokio::fs::write(job.output, out)
                    .await
                    .map_err(|e| ProxyError::io("writing fake artifact", e))
            }
            Behaviour::Fail => Err(ProxyError::ToolExit {
                command: "fake-instrument".to_string(),
                code: Some(1),
                output: "instrumentation failed".to_string(),
            }),
            Behaviour::Silent => Ok(()),
        }
    }
}
