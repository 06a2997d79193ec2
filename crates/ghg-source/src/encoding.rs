//! Text encoding probe
//!
//! Delimited exports come from regional spreadsheet tools and carry no
//! reliable encoding declaration. Candidates are tried in a fixed preference
//! order; the first that decodes without error wins.

use encoding_rs::{Encoding, GBK, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::fmt;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Candidate text encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// UTF-8, leading signature stripped when present
    Utf8Sig,
    /// Strict UTF-8
    Utf8,
    /// GBK (simplified Chinese)
    Gbk,
    /// GB2312 label; decoded with the GBK superset
    Gb2312,
    /// ISO-8859-1 / windows-1252; accepts any byte sequence
    Latin1,
}

impl TextEncoding {
    /// Default probe order
    pub const DEFAULT_ORDER: [Self; 5] = [Self::Utf8Sig, Self::Utf8, Self::Gbk, Self::Gb2312, Self::Latin1];

    /// Conventional label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8Sig => "utf-8-sig",
            Self::Utf8 => "utf-8",
            Self::Gbk => "gbk",
            Self::Gb2312 => "gb2312",
            Self::Latin1 => "latin-1",
        }
    }

    /// Decode strictly; `None` on any malformed sequence
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Self::Gbk => strict(GBK, bytes),
            Self::Gb2312 => strict(Encoding::for_label(b"gb2312").unwrap_or(GBK), bytes),
            Self::Latin1 => strict(WINDOWS_1252, bytes),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
}

/// Decode with the first encoding in `order` that succeeds
#[must_use]
pub fn decode_with_fallback(bytes: &[u8], order: &[TextEncoding]) -> Option<(String, TextEncoding)> {
    order.iter().find_map(|encoding| match encoding.decode(bytes) {
        Some(text) => Some((text, *encoding)),
        None => {
            tracing::debug!(encoding = %encoding, "decode attempt failed");
            None
        }
    })
}

/// Comma-separated labels, for diagnostics
#[must_use]
pub fn describe_order(order: &[TextEncoding]) -> String {
    order
        .iter()
        .map(|e| e.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_signature_is_stripped() {
        let bytes = [UTF8_BOM, "名称,值".as_bytes()].concat();
        let (text, used) = decode_with_fallback(&bytes, &TextEncoding::DEFAULT_ORDER).unwrap();
        assert_eq!(text, "名称,值");
        assert_eq!(used, TextEncoding::Utf8Sig);
    }

    #[test]
    fn gbk_bytes_fall_through_utf8() {
        let (bytes, _, _) = GBK.encode("范围一直接排放源");
        assert!(std::str::from_utf8(&bytes).is_err());
        let (text, used) = decode_with_fallback(&bytes, &TextEncoding::DEFAULT_ORDER).unwrap();
        assert_eq!(text, "范围一直接排放源");
        assert_eq!(used, TextEncoding::Gbk);
    }

    #[test]
    fn exhausting_candidates_yields_none() {
        let bytes = [0xFFu8, 0xFE, 0xFD];
        assert!(decode_with_fallback(&bytes, &[TextEncoding::Utf8]).is_none());
        assert!(decode_with_fallback(&bytes, &[]).is_none());
    }

    #[test]
    fn latin1_accepts_anything() {
        let bytes = [0xE9u8, b'a'];
        let (text, used) =
            decode_with_fallback(&bytes, &[TextEncoding::Utf8, TextEncoding::Latin1]).unwrap();
        assert_eq!(text, "éa");
        assert_eq!(used, TextEncoding::Latin1);
    }

    #[test]
    fn order_description() {
        assert_eq!(
            describe_order(&TextEncoding::DEFAULT_ORDER),
            "utf-8-sig, utf-8, gbk, gb2312, latin-1"
        );
    }
}
