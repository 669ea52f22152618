//! Content-addressed cache keys
//!
//! Keys depend only on the target host and the normalized body. Path, query
//! and declared content type never influence the key; the sanitized basename
//! only picks the file name inside the key's directory.

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Digest length in bytes (128 bits)
pub const DIGEST_BYTES: usize = 16;

/// Artifact name used when the request path has no segments
pub const DEFAULT_NAME: &str = "index";

/// Directory used for requests whose URL carries no host
const UNKNOWN_HOST: &str = "unknown-host";

/// The kinds of body that can be instrumented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Html,
    JavaScript,
}

impl ArtifactKind {
    /// File extension, also the value passed to the tool's `--kind`
    pub fn ext(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::JavaScript => "js",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ext())
    }
}

/// `(host, content hash)` pair identifying one instrumentation result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub host: String,
    pub hash: String,
}

impl CacheKey {
    /// Build a key from the request host and the already normalized body
    pub fn new(host: Option<&str>, normalized: &[u8]) -> Self {
        Self {
            host: host
                .filter(|h| !h.is_empty())
                .unwrap_or(UNKNOWN_HOST)
                .to_string(),
            hash: content_hash(normalized),
        }
    }

    /// `<root>/<host>/<hash>`
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.host).join(&self.hash)
    }
}

/// Hex-encoded 128-bit content digest (leading half of SHA-256)
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(&result[..DIGEST_BYTES])
}

/// Artifact basename for a request path.
///
/// Takes the last path segment, percent-decodes it, drops its extension and
/// keeps only ASCII alphanumerics, `-`, `_` and `.`; falls back to `index`.
pub fn artifact_name(path_components: &[String]) -> String {
    let Some(segment) = path_components.last() else {
        return DEFAULT_NAME.to_string();
    };
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let last: &str = &decoded;

    let stem = match last.rfind('.') {
        Some(i) if !last[..i].trim_start_matches('.').is_empty() => &last[..i],
        _ => last,
    };

    let name: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();

    if name.trim_matches('.').is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}
