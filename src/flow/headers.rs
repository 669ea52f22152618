//! Ordered, case-preserving header list with case-insensitive lookup

use serde::{Deserialize, Serialize};

/// Well-known header names the rewrite pipeline resolves
pub mod names {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
    pub const ACCESS_CONTROL_ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
    pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
    pub const LOCATION: &str = "Location";
    pub const ORIGIN: &str = "Origin";
    pub const SET_COOKIE: &str = "Set-Cookie";
}

/// HTTP headers as received, in wire order and with the sender's casing.
///
/// Duplicate names are allowed (`Set-Cookie`). Lookups ignore ASCII case;
/// mutations keep the casing of the first existing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Create an empty header list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.0[i].1.as_str())
    }

    /// All values for `name`, in order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether any header named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The key of the first `name` header exactly as the sender spelled it
    pub fn key(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.0[i].0.as_str())
    }

    /// Set `name` to a single value.
    ///
    /// The first matching entry keeps its position and casing; later
    /// duplicates are dropped. Appends when absent.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(i) => {
                self.0[i].1 = value;
                let mut index = 0;
                self.0.retain(|(k, _)| {
                    let keep = index <= i || !k.eq_ignore_ascii_case(name);
                    index += 1;
                    keep
                });
            }
            None => self.0.push((name.to_string(), value)),
        }
    }

    /// Append a header, keeping existing entries with the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Remove every `name` header, returning the first removed value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        first
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
