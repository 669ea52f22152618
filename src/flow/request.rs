//! Intercepted request as seen by the hooks

use super::headers::Headers;
use serde::{Deserialize, Serialize};
use url::Url;

/// One intercepted request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,

    /// Absolute request URL, possibly rewritten by the request hook
    pub url: String,

    /// URL before the request hook rewrote it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_url: Option<String>,

    /// Request headers
    #[serde(default)]
    pub headers: Headers,

    /// Query fragments to carry over onto redirect targets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_query: Vec<String>,

    /// Treat the response as a script regardless of path or headers
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_script: bool,

    /// Value of the `sync` query parameter removed by the request hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Request {
    /// Create a request with no headers
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            orig_url: None,
            headers: Headers::new(),
            custom_query: Vec::new(),
            force_script: false,
            sync: None,
        }
    }

    /// The URL the client originally asked for
    pub fn original_url(&self) -> &str {
        self.orig_url.as_deref().unwrap_or(&self.url)
    }

    fn parsed(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    /// Target host without port
    pub fn host(&self) -> Option<String> {
        self.parsed()?.host_str().map(str::to_string)
    }

    /// URL path including the query string, without the fragment
    pub fn path(&self) -> String {
        self.parsed()
            .map(|u| match u.query() {
                Some(query) => format!("{}?{}", u.path(), query),
                None => u.path().to_string(),
            })
            .unwrap_or_default()
    }

    /// Non-empty path segments, still percent-encoded
    pub fn path_components(&self) -> Vec<String> {
        self.parsed()
            .and_then(|u| {
                u.path_segments()
                    .map(|segments| segments.filter(|s| !s.is_empty()).map(str::to_string).collect())
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parts() {
        let req = Request::new("GET", "https://cdn.example:8443/static/js/app.min.js?v=3#x");
        assert_eq!(req.host().as_deref(), Some("cdn.example"));
        assert_eq!(req.path(), "/static/js/app.min.js?v=3");
        assert_eq!(req.path_components(), vec!["static", "js", "app.min.js"]);
    }

    #[test]
    fn root_has_no_components() {
        let req = Request::new("GET", "https://example.com/");
        assert!(req.path_components().is_empty());
        assert_eq!(req.path(), "/");
    }

    #[test]
    fn path_keeps_empty_query() {
        let req = Request::new("GET", "https://example.com/app.js?");
        assert_eq!(req.path(), "/app.js?");
        assert_eq!(req.path_components(), vec!["app.js"]);
    }

    #[test]
    fn trailing_slash_ignored() {
        let req = Request::new("GET", "https://example.com/docs/");
        assert_eq!(req.path_components(), vec!["docs"]);
    }

    #[test]
    fn unparseable_url() {
        let req = Request::new("GET", "not a url");
        assert_eq!(req.host(), None);
        assert_eq!(req.path(), "");
        assert!(req.path_components().is_empty());
    }

    #[test]
    fn original_url_falls_back() {
        let mut req = Request::new("GET", "https://x/y");
        assert_eq!(req.original_url(), "https://x/y");
        req.orig_url = Some("https://x/y?sync=1".to_string());
        assert_eq!(req.original_url(), "https://x/y?sync=1");
    }

    #[test]
    fn deserializes_minimal() {
        let req: Request = serde_json::from_str(r#"{"url":"https://x/y"}"#).unwrap();
        assert_eq!(req.method, "GET");
        assert!(req.headers.is_empty());
        assert!(!req.force_script);
    }
}
