//! Token binding table.
//!
//! Maps a delimited tag such as `{name}` to its replacement text and
//! substitutes every bound tag in one pass over a payload. A replacement
//! that itself contains a tag is not expanded again.

use crate::error::{OdfError, Result};
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Markup inserted in place of a newline in bound values
pub const LINE_BREAK: &str = "<text:line-break/>";

static XML_ESCAPER: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape the five XML special characters.
///
/// Quotes are escaped too, so values are safe inside attributes.
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"])
}

/// Prepare a value for storage: optional escaping, then line breaks
pub fn encode_value(value: &str, encode: bool) -> String {
    let value = if encode {
        escape_xml(value)
    } else {
        value.to_string()
    };
    value.replace('\n', LINE_BREAK)
}

/// Decode raw bytes from the named character set
pub fn decode_charset(bytes: &[u8], charset: &str) -> Result<String> {
    let encoding = encoding_rs::Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| OdfError::UnknownCharset(charset.to_string()))?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!("Malformed {} input replaced while decoding", encoding.name());
    }
    Ok(text.into_owned())
}

/// Bound tags and their replacement text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStore {
    tokens: BTreeMap<String, String>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `tag` occurs literally in any of `payloads`
    pub fn declared_in(tag: &str, payloads: &[&str]) -> bool {
        !tag.is_empty() && payloads.iter().any(|payload| payload.contains(tag))
    }

    /// Bind `tag` to `value`, replacing any earlier binding
    pub fn bind(&mut self, tag: impl Into<String>, value: &str, encode: bool) {
        self.tokens.insert(tag.into(), encode_value(value, encode));
    }

    /// Stored replacement for `tag`
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tokens.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Bound tags in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    /// Replace every bound tag in `payload`.
    ///
    /// Where two tags could match at the same position the longer one wins.
    pub fn apply(&self, payload: &str) -> Result<String> {
        if self.tokens.is_empty() {
            return Ok(payload.to_string());
        }
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(self.tokens.keys())?;
        let values: Vec<&str> = self.tokens.values().map(String::as_str).collect();
        Ok(automaton.replace_all(payload, &values))
    }

    /// Apply the bindings to each payload in place
    pub fn apply_all(&self, payloads: &mut [&mut String]) -> Result<()> {
        for payload in payloads.iter_mut() {
            let replaced = self.apply(payload.as_str())?;
            **payload = replaced;
        }
        Ok(())
    }
}
