//! Intercepted response and its body decoding

use super::headers::{names, Headers};
use crate::error::{ProxyError, ProxyResult};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One intercepted response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status_code: u16,

    /// Response headers
    #[serde(default)]
    pub headers: Headers,

    /// Raw body bytes
    #[serde(default, with = "super::body")]
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with no headers and an empty body
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Replace the body, keeping an existing `Content-Length` in step
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
        if self.headers.contains(names::CONTENT_LENGTH) {
            self.headers
                .set(names::CONTENT_LENGTH, self.body.len().to_string());
        }
    }

    /// Remove any `Content-Encoding` from the body.
    ///
    /// Supports `gzip`, `deflate` (zlib-wrapped or raw) and `identity`,
    /// including comma-separated stacks of them. The header is dropped once
    /// the body is decoded. An unsupported or corrupt encoding leaves the
    /// response untouched and returns `ProxyError::Decode`.
    pub fn decode(&mut self) -> ProxyResult<()> {
        let Some(header) = self.headers.get(names::CONTENT_ENCODING) else {
            return Ok(());
        };
        let header = header.to_ascii_lowercase();

        let mut body = self.body.clone();
        for encoding in header.split(',').map(str::trim).rev() {
            body = match encoding {
                "" | "identity" | "none" => body,
                "gzip" | "x-gzip" => read_all(GzDecoder::new(&body[..]), encoding)?,
                "deflate" => read_all(ZlibDecoder::new(&body[..]), encoding)
                    .or_else(|_| read_all(DeflateDecoder::new(&body[..]), encoding))?,
                other => {
                    return Err(ProxyError::Decode {
                        encoding: other.to_string(),
                        reason: "unsupported content encoding".to_string(),
                    })
                }
            };
        }

        self.headers.remove(names::CONTENT_ENCODING);
        self.set_body(body);
        Ok(())
    }
}

fn read_all(mut reader: impl Read, encoding: &str) -> ProxyResult<Vec<u8>> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| ProxyError::Decode {
            encoding: encoding.to_string(),
            reason: e.to_string(),
        })?;
    Ok(out)
}
