//! Content classification
//!
//! Decides what a response body actually is, independent of what the server
//! declared. Disagreements between the declared `Content-Type` and the body
//! are reported as warnings, never as errors.
//!
//! # Priority
//!
//! | Declared | Body | Decision |
//! |----------|------|----------|
//! | mentions `html` | empty or starts like HTML | html |
//! | mentions `html` | parses as JavaScript | javascript (warned) |
//! | mentions `html` | anything else | html (warned) |
//! | mentions `javascript` | anything | javascript |
//! | other | anything | unknown (warned if it sniffs as html/js) |
//! | absent | anything | unknown (warned if it sniffs as html/js) |

pub mod sniff;
pub mod syntax;

pub use sniff::{looks_like_html, looks_like_json};
pub use syntax::{ProcessSyntaxChecker, SyntaxChecker};

use crate::encoding::normalize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// What a body was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    JavaScript,
    Unknown,
}

impl ContentKind {
    /// `Content-Type` value written for an instrumented body
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Html => Some("text/html; charset=utf-8"),
            Self::JavaScript => Some("text/javascript"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Html => "html",
            Self::JavaScript => "javascript",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// A disagreement between the declared type and the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Declared HTML, body does not start like HTML
    NotHtml,
    /// Body starts like HTML, declared type says otherwise or is missing
    LooksLikeHtml,
    /// Body parses as JavaScript, declared type says otherwise or is missing
    LooksLikeJavaScript,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotHtml => "does not look like HTML",
            Self::LooksLikeHtml => "looks like HTML",
            Self::LooksLikeJavaScript => "looks like JavaScript",
        };
        write!(f, "{}", text)
    }
}

/// Classification result for one body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub kind: ContentKind,
    /// Declared type as passed in, lower-cased (empty when absent)
    pub declared: String,
    pub warnings: Vec<Mismatch>,
}

/// Body classifier
#[derive(Clone)]
pub struct Classifier {
    syntax: Arc<dyn SyntaxChecker>,
}

impl Classifier {
    pub fn new(syntax: Arc<dyn SyntaxChecker>) -> Self {
        Self { syntax }
    }

    /// Parses as JavaScript: not JSON, and the external checker accepts it
    pub async fn looks_like_javascript(&self, stripped: &[u8]) -> bool {
        !looks_like_json(stripped) && !self.syntax.has_syntax_error(stripped).await
    }

    /// Classify `body` given an optional declared `Content-Type`.
    ///
    /// Without a declared type the result is always `Unknown`; callers fall
    /// back to the request path for those.
    pub async fn classify(&self, url: &str, body: &[u8], declared: Option<&str>) -> Decision {
        let normalized = normalize(body);
        let stripped = sniff::trim(&normalized);
        let declared = declared.map(str::to_ascii_lowercase).unwrap_or_default();
        let mut report = Report::new(url, &declared, stripped);

        let kind = if declared.is_empty() {
            if !stripped.is_empty() {
                if looks_like_html(stripped) {
                    report.warn(Mismatch::LooksLikeHtml);
                } else if self.looks_like_javascript(stripped).await {
                    report.warn(Mismatch::LooksLikeJavaScript);
                }
            }
            ContentKind::Unknown
        } else if declared.contains("html") {
            if stripped.is_empty() || looks_like_html(stripped) {
                ContentKind::Html
            } else {
                report.warn(Mismatch::NotHtml);
                if self.looks_like_javascript(stripped).await {
                    ContentKind::JavaScript
                } else if declared == "text/html" {
                    ContentKind::Html
                } else {
                    ContentKind::Unknown
                }
            }
        } else {
            if looks_like_html(stripped) {
                report.warn(Mismatch::LooksLikeHtml);
            }
            if declared.contains("javascript") {
                ContentKind::JavaScript
            } else {
                if !declared.contains("json")
                    && !stripped.is_empty()
                    && self.looks_like_javascript(stripped).await
                {
                    report.warn(Mismatch::LooksLikeJavaScript);
                }
                ContentKind::Unknown
            }
        };

        Decision {
            kind,
            warnings: report.warnings,
            declared,
        }
    }
}

/// Collects mismatch warnings and logs each as it is raised
struct Report<'a> {
    url: &'a str,
    declared: &'a str,
    stripped: &'a [u8],
    warnings: Vec<Mismatch>,
}

impl<'a> Report<'a> {
    fn new(url: &'a str, declared: &'a str, stripped: &'a [u8]) -> Self {
        Self {
            url,
            declared,
            stripped,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, mismatch: Mismatch) {
        let source = sniff::preview(self.stripped);
        if self.declared.is_empty() {
            warn!(source = %source, "'{}' {}, but Content-Type was missing", self.url, mismatch);
        } else {
            warn!(
                source = %source,
                "'{}' {}, but Content-Type was '{}'", self.url, mismatch, self.declared
            );
        }
        self.warnings.push(mismatch);
    }
}
