//! Response rewrite pass
//!
//! One pass per response, in a fixed order:
//!
//! ```text
//! Decode -> ClassifyHints -> HeaderCaptureScan -> RedirectQueryMerge
//!        -> Instrument -> RedirectLoopCheck -> CorsApply -> CspStrip
//! ```
//!
//! Mutations already applied when a later step fails are kept.

use super::mutate::{self, HeaderIndex};
use crate::cache::{ArtifactKind, InstrumentationCache};
use crate::classify::{sniff, Classifier, ContentKind};
use crate::config::InstrumentConfig;
use crate::encoding::normalize;
use crate::error::{ProxyError, ProxyResult};
use crate::flow::{Flow, Request, Response};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Body served in place of a script that turned out to be an HTML page
pub const UNEXPECTED_SCRIPT: &str = r#"console.error("UNEXPECTED");"#;

const JAVASCRIPT: &str = "text/javascript";

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The flow already carried an error; nothing was touched
    Skipped,
    /// The pass stopped early; see the flow error or the log
    Failed,
    /// The pass ran to completion
    Rewritten(ContentKind),
}

/// Which kinds are handed to the instrumentation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSwitches {
    pub html: bool,
    pub javascript: bool,
}

impl Default for KindSwitches {
    fn default() -> Self {
        Self {
            html: true,
            javascript: true,
        }
    }
}

impl From<&InstrumentConfig> for KindSwitches {
    fn from(config: &InstrumentConfig) -> Self {
        Self {
            html: config.html,
            javascript: config.javascript,
        }
    }
}

/// Rewrites responses in place
pub struct ResponsePipeline {
    classifier: Classifier,
    cache: Arc<InstrumentationCache>,
    switches: KindSwitches,
}

impl ResponsePipeline {
    pub fn new(classifier: Classifier, cache: Arc<InstrumentationCache>, switches: KindSwitches) -> Self {
        Self {
            classifier,
            cache,
            switches,
        }
    }

    /// Run one pass over `flow`. Never fails; problems are logged and, for
    /// decode failures, recorded on the flow.
    pub async fn process(&self, flow: &mut Flow) -> Outcome {
        if let Some(err) = &flow.error {
            warn!("Skipping {}: {}", flow.request.url, err);
            return Outcome::Skipped;
        }

        match self.rewrite(flow).await {
            Ok(kind) => Outcome::Rewritten(kind),
            Err(e) => {
                error!("Rewriting {} failed: {}", flow.request.url, e);
                Outcome::Failed
            }
        }
    }

    async fn rewrite(&self, flow: &mut Flow) -> ProxyResult<ContentKind> {
        let Flow {
            request,
            response,
            error,
        } = flow;
        let response = response.as_mut().ok_or(ProxyError::NoResponse)?;

        if let Err(e) = response.decode() {
            *error = Some(e.to_string());
            return Err(e);
        }

        let mut content_type = classify_hint(request, response);

        let index = HeaderIndex::scan(&response.headers);
        if content_type.is_none() {
            content_type = index
                .content_type
                .as_deref()
                .and_then(|key| response.headers.get(key))
                .map(str::to_ascii_lowercase);
        }

        mutate::merge_redirect_query(response, &index, &request.custom_query);

        let decision = self
            .classifier
            .classify(&request.url, &response.body, content_type.as_deref())
            .await;
        debug!("{} classified as {}", request.url, decision.kind);

        match decision.kind {
            ContentKind::Html => self.rewrite_html(request, response, &index).await,
            ContentKind::JavaScript => self.rewrite_javascript(request, response, &index).await,
            ContentKind::Unknown => {}
        }

        if mutate::break_redirect_loop(response, &index, &request.url) {
            warn!("Broke self-redirect at {}", request.url);
        }
        mutate::apply_cors(response, &index, request);
        mutate::strip_csp(response, &index);

        Ok(decision.kind)
    }

    async fn rewrite_html(&self, request: &Request, response: &mut Response, index: &HeaderIndex) {
        if self.switches.html {
            let body = if sniff::trim(&response.body).is_empty() {
                Vec::new()
            } else {
                self.instrument_or_passthrough(request, &response.body, ArtifactKind::Html)
                    .await
            };
            response.set_body(body);
        }
        set_content_type(response, index, ContentKind::Html);
    }

    async fn rewrite_javascript(&self, request: &Request, response: &mut Response, index: &HeaderIndex) {
        let is_html_page = sniff::looks_like_html(sniff::trim(&normalize(&response.body)));

        if is_html_page {
            warn!("{} was served as a script but is an HTML page", request.url);
            response.status_code = 500;
            response.set_body(UNEXPECTED_SCRIPT);
        } else if self.switches.javascript {
            let body = self
                .instrument_or_passthrough(request, &response.body, ArtifactKind::JavaScript)
                .await;
            response.set_body(body);
        }
        set_content_type(response, index, ContentKind::JavaScript);
    }

    /// Instrumented body, or the original one when instrumentation fails
    async fn instrument_or_passthrough(&self, request: &Request, body: &[u8], kind: ArtifactKind) -> Vec<u8> {
        match self.cache.instrument(request, body, kind).await {
            Ok(instrumented) => instrumented.body,
            Err(e) => {
                warn!(
                    "Instrumenting {} as {} failed, passing it through: {}",
                    request.original_url(),
                    kind,
                    e
                );
                body.to_vec()
            }
        }
    }
}

/// Content type implied by the status code or the request itself.
///
/// A 204 is turned into a 200 carrying an (empty) script so execution hooks
/// still fire.
fn classify_hint(request: &Request, response: &mut Response) -> Option<String> {
    if response.status_code == 204 {
        response.status_code = 200;
        return Some(JAVASCRIPT.to_string());
    }

    let path = request.path();
    if path.ends_with(".js") || request.force_script {
        Some(JAVASCRIPT.to_string())
    } else if path.ends_with(".html") {
        Some("text/html".to_string())
    } else {
        None
    }
}

fn set_content_type(response: &mut Response, index: &HeaderIndex, kind: ContentKind) {
    if let Some(value) = kind.content_type() {
        let key = index.content_type_key().to_string();
        response.headers.set(&key, value);
    }
}
