//! Request preprocessing: `sync` parameter removal

use crate::flow::Request;
use tracing::debug;

/// Query parameter removed from every request URL
pub const SYNC_PARAM: &str = "sync=";

/// Remove the first `sync=` query parameter from `url`.
///
/// Returns the rewritten URL and the parameter's value, or `None` when the
/// query has no `sync` parameter. The rest of the query (and any fragment)
/// is kept as-is.
pub fn strip_sync(url: &str) -> Option<(String, String)> {
    let query_start = url.find('?')? + 1;
    let query_end = url[query_start..]
        .find('#')
        .map_or(url.len(), |i| query_start + i);

    let mut offset = query_start;
    for param in url[query_start..query_end].split('&') {
        if let Some(value) = param.strip_prefix(SYNC_PARAM) {
            let param_end = offset + param.len();
            // Take the following `&` when there is one, else the preceding separator
            let (cut_start, cut_end) = if param_end < query_end {
                (offset, param_end + 1)
            } else {
                (offset - 1, param_end)
            };

            let mut stripped = String::with_capacity(url.len());
            stripped.push_str(&url[..cut_start]);
            stripped.push_str(&url[cut_end..]);
            return Some((stripped, value.to_string()));
        }
        offset += param.len() + 1;
    }
    None
}

/// Record the original URL and strip the `sync` parameter
pub fn preprocess(request: &mut Request) {
    request.orig_url = Some(request.url.clone());

    if let Some((url, sync)) = strip_sync(&request.url) {
        debug!("Stripped sync={} from {}", sync, request.url);
        request.url = url;
        request.sync = Some(sync);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripped(url: &str) -> String {
        strip_sync(url).map(|(u, _)| u).unwrap_or_else(|| url.to_string())
    }

    #[test]
    fn middle_parameter() {
        assert_eq!(stripped("https://x/y?a=1&sync=ZZZ&b=2"), "https://x/y?a=1&b=2");
    }

    #[test]
    fn only_parameter() {
        assert_eq!(stripped("https://x/y?sync=ZZZ"), "https://x/y");
    }

    #[test]
    fn first_parameter() {
        assert_eq!(stripped("https://x/y?sync=ZZZ&b=2"), "https://x/y?b=2");
    }

    #[test]
    fn last_parameter() {
        assert_eq!(stripped("https://x/y?a=1&sync=ZZZ"), "https://x/y?a=1");
    }

    #[test]
    fn fragment_kept() {
        assert_eq!(stripped("https://x/y?sync=1#top"), "https://x/y#top");
        assert_eq!(stripped("https://x/y?a=1&sync=1#top"), "https://x/y?a=1#top");
    }

    #[test]
    fn value_extracted() {
        let (_, value) = strip_sync("https://x/y?a=1&sync=ZZZ&b=2").unwrap();
        assert_eq!(value, "ZZZ");
        let (_, value) = strip_sync("https://x/y?sync=").unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn absent_is_noop() {
        assert_eq!(strip_sync("https://x/y"), None);
        assert_eq!(strip_sync("https://x/y?a=1"), None);
        assert_eq!(strip_sync("https://x/sync=1"), None);
    }

    #[test]
    fn similar_names_ignored() {
        assert_eq!(strip_sync("https://x/y?async=1&nosync=2"), None);
    }

    #[test]
    fn preprocess_keeps_original() {
        let mut req = Request::new("GET", "https://x/y?a=1&sync=ZZZ&b=2");
        preprocess(&mut req);
        assert_eq!(req.url, "https://x/y?a=1&b=2");
        assert_eq!(req.orig_url.as_deref(), Some("https://x/y?a=1&sync=ZZZ&b=2"));
        assert_eq!(req.sync.as_deref(), Some("ZZZ"));
    }

    #[test]
    fn preprocess_without_sync() {
        let mut req = Request::new("GET", "https://x/y");
        preprocess(&mut req);
        assert_eq!(req.url, "https://x/y");
        assert_eq!(req.orig_url.as_deref(), Some("https://x/y"));
        assert_eq!(req.sync, None);
    }
}
