//! JSON representation of message bodies
//!
//! Bodies are written as `{"text": "..."}` when they are valid UTF-8 and as
//! `{"base64": "..."}` otherwise. Both forms are accepted on input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BodyRepr {
    Text { text: String },
    Base64 { base64: String },
}

pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    let repr = match std::str::from_utf8(body) {
        Ok(text) => BodyRepr::Text {
            text: text.to_string(),
        },
        Err(_) => BodyRepr::Base64 {
            base64: STANDARD.encode(body),
        },
    };
    repr.serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    match BodyRepr::deserialize(deserializer)? {
        BodyRepr::Text { text } => Ok(text.into_bytes()),
        BodyRepr::Base64 { base64 } => STANDARD
            .decode(base64.as_bytes())
            .map_err(serde::de::Error::custom),
    }
}
