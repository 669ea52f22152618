//! Byte-order-mark detection and UTF-16 to UTF-8 normalization
//!
//! Bodies are normalized before hashing, before being written to the cache
//! and before being fed to any external tool. Only UTF-16 marks are
//! recognized; everything else (UTF-8 with or without a mark included) is
//! returned untouched.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use std::borrow::Cow;
use tracing::debug;

/// A leading UTF-16 byte-order mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf16Bom {
    /// `FE FF`
    BigEndian,
    /// `FF FE`, also what a native-order UTF-16 writer emits on little-endian hosts
    LittleEndian,
}

impl Utf16Bom {
    const BE: [u8; 2] = [0xFE, 0xFF];
    const LE: [u8; 2] = [0xFF, 0xFE];

    /// Detect a UTF-16 byte-order mark at the start of `bytes`
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&Self::BE) {
            Some(Self::BigEndian)
        } else if bytes.starts_with(&Self::LE) {
            Some(Self::LittleEndian)
        } else {
            None
        }
    }

    fn encoding(self) -> &'static Encoding {
        match self {
            Self::BigEndian => UTF_16BE,
            Self::LittleEndian => UTF_16LE,
        }
    }
}

/// Re-encode a UTF-16 body carrying a byte-order mark as UTF-8.
///
/// The mark itself is dropped. Input without a UTF-16 mark, or whose code
/// units do not decode cleanly, is returned as-is.
pub fn normalize(bytes: &[u8]) -> Cow<'_, [u8]> {
    let Some(bom) = Utf16Bom::detect(bytes) else {
        return Cow::Borrowed(bytes);
    };

    match bom
        .encoding()
        .decode_without_bom_handling_and_without_replacement(&bytes[2..])
    {
        Some(text) => Cow::Owned(text.into_owned().into_bytes()),
        None => {
            debug!("Malformed {:?} UTF-16 body, passing through undecoded", bom);
            Cow::Borrowed(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str, bom: Utf16Bom) -> Vec<u8> {
        let mut out = match bom {
            Utf16Bom::BigEndian => vec![0xFE, 0xFF],
            Utf16Bom::LittleEndian => vec![0xFF, 0xFE],
        };
        for unit in text.encode_utf16() {
            match bom {
                Utf16Bom::BigEndian => out.extend_from_slice(&unit.to_be_bytes()),
                Utf16Bom::LittleEndian => out.extend_from_slice(&unit.to_le_bytes()),
            }
        }
        out
    }

    #[test]
    fn plain_bytes_unchanged() {
        let input = b"var a = 1;";
        assert!(matches!(normalize(input), Cow::Borrowed(_)));
        assert_eq!(normalize(input).as_ref(), input);
    }

    #[test]
    fn utf8_bom_unchanged() {
        let input = b"\xEF\xBB\xBF<html>";
        assert_eq!(normalize(input).as_ref(), input);
    }

    #[test]
    fn big_endian_reencoded() {
        let text = "<!DOCTYPE html><p>h\u{e9}llo \u{1F600}</p>";
        let input = utf16(text, Utf16Bom::BigEndian);
        assert_eq!(Utf16Bom::detect(&input), Some(Utf16Bom::BigEndian));
        assert_eq!(std::str::from_utf8(&normalize(&input)).unwrap(), text);
    }

    #[test]
    fn little_endian_reencoded() {
        let text = "alert('\u{4e2d}\u{6587}');";
        let input = utf16(text, Utf16Bom::LittleEndian);
        assert_eq!(Utf16Bom::detect(&input), Some(Utf16Bom::LittleEndian));
        assert_eq!(std::str::from_utf8(&normalize(&input)).unwrap(), text);
    }

    #[test]
    fn empty_after_bom() {
        assert_eq!(normalize(&[0xFF, 0xFE]).as_ref(), b"");
    }

    #[test]
    fn malformed_passes_through() {
        // Lone high surrogate followed by an odd trailing byte
        let input = [0xFF, 0xFE, 0x00, 0xD8, 0x41];
        assert_eq!(normalize(&input).as_ref(), &input[..]);
    }
}
