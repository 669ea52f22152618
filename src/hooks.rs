//! Hooks the host proxy calls for every flow

use crate::cache::{InstrumentationCache, Instrumenter, ProcessInstrumenter};
use crate::classify::{Classifier, ProcessSyntaxChecker, SyntaxChecker};
use crate::config::{Config, InstrumentConfig};
use crate::flow::Flow;
use crate::pipeline::{self, KindSwitches, Outcome, ResponsePipeline};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Per-flow callbacks. Implementations contain their own failures; nothing
/// is ever reported back to the host.
#[async_trait]
pub trait FlowHook: Send + Sync {
    /// Called once a request arrives, before it is forwarded
    async fn request(&self, flow: &mut Flow);

    /// Called once the upstream response arrives, before it is returned
    async fn response(&self, flow: &mut Flow);
}

/// Request preprocessing plus the response rewrite pass
pub struct Rewriter {
    pipeline: ResponsePipeline,
}

impl Rewriter {
    /// Build a rewriter around explicit tool backends
    pub fn new(
        config: &InstrumentConfig,
        instrumenter: Arc<dyn Instrumenter>,
        syntax: Arc<dyn SyntaxChecker>,
    ) -> Self {
        let cache = Arc::new(InstrumentationCache::new(config, instrumenter));
        let pipeline = ResponsePipeline::new(
            Classifier::new(syntax),
            cache,
            KindSwitches::from(config),
        );
        Self { pipeline }
    }

    /// Build a rewriter that shells out to the configured tools
    pub fn from_config(config: &Config) -> Self {
        debug!(
            "Rewriter: mode={}, use_cache={}, cache_dir={}",
            config.instrument.mode,
            config.instrument.use_cache,
            config.instrument.cache_dir.display()
        );
        Self::new(
            &config.instrument,
            Arc::new(ProcessInstrumenter::new(&config.instrument)),
            Arc::new(ProcessSyntaxChecker::new(&config.syntax)),
        )
    }

    /// Rewrite the flow's response and report how the pass ended
    pub async fn rewrite_response(&self, flow: &mut Flow) -> Outcome {
        self.pipeline.process(flow).await
    }
}

#[async_trait]
impl FlowHook for Rewriter {
    async fn request(&self, flow: &mut Flow) {
        pipeline::preprocess(&mut flow.request);
    }

    async fn response(&self, flow: &mut Flow) {
        self.rewrite_response(flow).await;
    }
}

/// Run both hooks over a complete recorded flow on its own task
pub fn spawn_replay(hook: Arc<dyn FlowHook>, mut flow: Flow) -> JoinHandle<Flow> {
    tokio::spawn(async move {
        hook.request(&mut flow).await;
        hook.response(&mut flow).await;
        flow
    })
}
