//! Custom document properties in meta.xml
//!
//! User-defined properties look like
//! `<meta:user-defined meta:name="Client" meta:value-type="string">ACME</meta:user-defined>`.
//! Only existing properties can be updated; their attributes are kept and
//! the rest of meta.xml is left byte for byte as it was.

use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

const ELEMENT_NAME: &str = "meta:user-defined";

/// Location of a property element in meta.xml
#[derive(Debug, Clone, PartialEq, Eq)]
struct PropertyElement<'a> {
    /// Whole element, start tag to end tag
    range: Range<usize>,
    /// Attribute text of the start tag
    attributes: &'a str,
}

/// Whether the start tag carries `meta:name` equal to `key`
fn has_name(e: &BytesStart<'_>, key: &str) -> Result<bool> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"meta:name" {
            return Ok(attr.unescape_value()? == key);
        }
    }
    Ok(false)
}

/// Attribute text of a start or empty tag, without name and brackets
fn attribute_text(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_end_matches('>').trim_end_matches('/');
    inner.strip_prefix(ELEMENT_NAME).unwrap_or(inner).trim()
}

/// Find the first `meta:user-defined` element named `key`
fn find_property<'a>(meta: &'a str, key: &str) -> Result<Option<PropertyElement<'a>>> {
    let mut reader = Reader::from_str(meta);

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Empty(e) if e.name().as_ref() == ELEMENT_NAME.as_bytes() => {
                if has_name(&e, key)? {
                    let end = reader.buffer_position() as usize;
                    return Ok(Some(PropertyElement {
                        range: start..end,
                        attributes: attribute_text(&meta[start..end]),
                    }));
                }
            }
            Event::Start(e) if e.name().as_ref() == ELEMENT_NAME.as_bytes() => {
                if !has_name(&e, key)? {
                    continue;
                }
                let tag_end = reader.buffer_position() as usize;
                let mut depth = 0usize;
                loop {
                    match reader.read_event()? {
                        Event::Start(_) => depth += 1,
                        Event::End(_) if depth == 0 => break,
                        Event::End(_) => depth -= 1,
                        Event::Eof => return Ok(None),
                        _ => {}
                    }
                }
                let end = reader.buffer_position() as usize;
                return Ok(Some(PropertyElement {
                    range: start..end,
                    attributes: attribute_text(&meta[start..tag_end]),
                }));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Whether a property named `key` exists
pub fn property_exists(meta: &str, key: &str) -> Result<bool> {
    Ok(find_property(meta, key)?.is_some())
}

/// Replace the value of property `key`, or `None` when it does not exist.
///
/// `value` is inserted as given.
pub fn set_property(meta: &str, key: &str, value: &str) -> Result<Option<String>> {
    let Some(element) = find_property(meta, key)? else {
        return Ok(None);
    };
    Ok(Some(format!(
        "{}<{} {}>{}</{}>{}",
        &meta[..element.range.start],
        ELEMENT_NAME,
        element.attributes,
        value,
        ELEMENT_NAME,
        &meta[element.range.end..]
    )))
}
