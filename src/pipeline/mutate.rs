//! Header mutations applied to every rewritten response

use crate::flow::{names, Headers, Request, Response};

/// Original-case keys of the well-known response headers.
///
/// Built from one scan per response pass; mutations go through these keys
/// so the sender's spelling survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    pub content_type: Option<String>,
    pub allow_origin: Option<String>,
    pub allow_credentials: Option<String>,
    pub csp: Option<String>,
    pub location: Option<String>,
    pub origin: Option<String>,
    pub set_cookie: Option<String>,
}

impl HeaderIndex {
    /// Resolve the well-known names in a single pass; first occurrence wins
    pub fn scan(headers: &Headers) -> Self {
        let mut index = Self::default();
        for (key, _) in headers.iter() {
            let slot = if key.eq_ignore_ascii_case(names::CONTENT_TYPE) {
                &mut index.content_type
            } else if key.eq_ignore_ascii_case(names::ACCESS_CONTROL_ALLOW_ORIGIN) {
                &mut index.allow_origin
            } else if key.eq_ignore_ascii_case(names::ACCESS_CONTROL_ALLOW_CREDENTIALS) {
                &mut index.allow_credentials
            } else if key.eq_ignore_ascii_case(names::CONTENT_SECURITY_POLICY) {
                &mut index.csp
            } else if key.eq_ignore_ascii_case(names::LOCATION) {
                &mut index.location
            } else if key.eq_ignore_ascii_case(names::ORIGIN) {
                &mut index.origin
            } else if key.eq_ignore_ascii_case(names::SET_COOKIE) {
                &mut index.set_cookie
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(key.to_string());
            }
        }
        index
    }

    /// Key to write `Content-Type` under
    pub fn content_type_key(&self) -> &str {
        self.content_type.as_deref().unwrap_or(names::CONTENT_TYPE)
    }

    /// Key to write `Access-Control-Allow-Origin` under
    pub fn allow_origin_key(&self) -> &str {
        self.allow_origin
            .as_deref()
            .unwrap_or(names::ACCESS_CONTROL_ALLOW_ORIGIN)
    }
}

fn value<'a>(headers: &'a Headers, key: &Option<String>) -> Option<&'a str> {
    key.as_deref().and_then(|k| headers.get(k))
}

/// Carry the request's custom query fragments onto a 301/302 target
pub fn merge_redirect_query(response: &mut Response, index: &HeaderIndex, custom_query: &[String]) {
    if !matches!(response.status_code, 301 | 302) || custom_query.is_empty() {
        return;
    }
    let Some(key) = index.location.as_deref() else {
        return;
    };
    let Some(location) = response.headers.get(key) else {
        return;
    };

    let separator = if location.contains('?') { '&' } else { '?' };
    let merged = format!("{}{}{}", location, separator, custom_query.join("&"));
    response.headers.set(key, merged);
}

/// Drop a `Location` pointing back at the request itself and fail the response.
///
/// Returns whether a loop was broken.
pub fn break_redirect_loop(response: &mut Response, index: &HeaderIndex, request_url: &str) -> bool {
    let Some(key) = index.location.as_deref() else {
        return false;
    };
    if response.headers.get(key) != Some(request_url) {
        return false;
    }

    response.headers.remove(key);
    response.status_code = 500;
    true
}

/// Allow cross-origin reads: echo the request origin for credentialed
/// responses, `*` otherwise
pub fn apply_cors(response: &mut Response, index: &HeaderIndex, request: &Request) {
    let credentialed = value(&response.headers, &index.allow_credentials) == Some("true");
    let origin = request.headers.get(names::ORIGIN);

    let allow = match (credentialed, origin) {
        (true, Some(origin)) => origin.to_string(),
        _ => "*".to_string(),
    };
    let key = index.allow_origin_key().to_string();
    response.headers.set(&key, allow);
}

/// Remove `Content-Security-Policy`. Returns whether one was present.
pub fn strip_csp(response: &mut Response, index: &HeaderIndex) -> bool {
    match index.csp.as_deref() {
        Some(key) => response.headers.remove(key).is_some(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)]) -> Response {
        let mut resp = Response::new(status);
        resp.headers = headers.iter().copied().collect();
        resp
    }

    #[test]
    fn scan_keeps_original_case() {
        let headers: Headers = [
            ("content-TYPE", "text/html"),
            ("LOCATION", "/next"),
            ("location", "/ignored"),
            ("X-Other", "1"),
        ]
        .into_iter()
        .collect();
        let index = HeaderIndex::scan(&headers);
        assert_eq!(index.content_type.as_deref(), Some("content-TYPE"));
        assert_eq!(index.location.as_deref(), Some("LOCATION"));
        assert_eq!(index.csp, None);
        assert_eq!(index.allow_origin_key(), "Access-Control-Allow-Origin");
    }

    #[test]
    fn redirect_query_appended_with_question_mark() {
        let mut resp = response(302, &[("Location", "https://x/next")]);
        let index = HeaderIndex::scan(&resp.headers);
        merge_redirect_query(&mut resp, &index, &["a=1".to_string(), "b=2".to_string()]);
        assert_eq!(resp.headers.get("location"), Some("https://x/next?a=1&b=2"));
    }

    #[test]
    fn redirect_query_appended_with_ampersand() {
        let mut resp = response(301, &[("location", "https://x/next?q=0")]);
        let index = HeaderIndex::scan(&resp.headers);
        merge_redirect_query(&mut resp, &index, &["a=1".to_string()]);
        assert_eq!(resp.headers.get("Location"), Some("https://x/next?q=0&a=1"));
    }

    #[test]
    fn redirect_query_only_for_redirects() {
        let mut resp = response(200, &[("Location", "https://x/next")]);
        let index = HeaderIndex::scan(&resp.headers);
        merge_redirect_query(&mut resp, &index, &["a=1".to_string()]);
        assert_eq!(resp.headers.get("Location"), Some("https://x/next"));

        let mut resp = response(302, &[("Location", "https://x/next")]);
        let index = HeaderIndex::scan(&resp.headers);
        merge_redirect_query(&mut resp, &index, &[]);
        assert_eq!(resp.headers.get("Location"), Some("https://x/next"));
    }

    #[test]
    fn self_redirect_broken() {
        let mut resp = response(302, &[("Location", "https://x/y")]);
        let index = HeaderIndex::scan(&resp.headers);
        assert!(break_redirect_loop(&mut resp, &index, "https://x/y"));
        assert_eq!(resp.status_code, 500);
        assert!(!resp.headers.contains("Location"));
    }

    #[test]
    fn other_redirect_kept() {
        let mut resp = response(302, &[("Location", "https://x/z")]);
        let index = HeaderIndex::scan(&resp.headers);
        assert!(!break_redirect_loop(&mut resp, &index, "https://x/y"));
        assert_eq!(resp.status_code, 302);
    }

    #[test]
    fn cors_echoes_origin_for_credentials() {
        let mut resp = response(200, &[("access-control-allow-credentials", "true")]);
        let mut req = Request::new("GET", "https://b.example/api");
        req.headers.append("Origin", "https://a.example");
        let index = HeaderIndex::scan(&resp.headers);
        apply_cors(&mut resp, &index, &req);
        assert_eq!(
            resp.headers.get("Access-Control-Allow-Origin"),
            Some("https://a.example")
        );
    }

    #[test]
    fn cors_wildcard_without_pairing() {
        let req_with_origin = {
            let mut r = Request::new("GET", "https://b.example/api");
            r.headers.append("origin", "https://a.example");
            r
        };

        // Origin but no credentials
        let mut resp = response(200, &[("Access-Control-Allow-Origin", "https://c.example")]);
        let index = HeaderIndex::scan(&resp.headers);
        apply_cors(&mut resp, &index, &req_with_origin);
        assert_eq!(resp.headers.get("access-control-allow-origin"), Some("*"));
        assert_eq!(resp.headers.len(), 1);

        // Credentials but no origin
        let mut resp = response(200, &[("Access-Control-Allow-Credentials", "true")]);
        let index = HeaderIndex::scan(&resp.headers);
        apply_cors(&mut resp, &index, &Request::new("GET", "https://b.example/api"));
        assert_eq!(resp.headers.get("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn csp_removed() {
        let mut resp = response(200, &[("content-security-policy", "script-src 'self'")]);
        let index = HeaderIndex::scan(&resp.headers);
        assert!(strip_csp(&mut resp, &index));
        assert!(resp.headers.is_empty());

        let index = HeaderIndex::scan(&resp.headers);
        assert!(!strip_csp(&mut resp, &index));
    }
}
