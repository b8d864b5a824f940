//! Segment marker search.
//!
//! Segments are delimited in the document text by
//! `[!-- BEGIN name --]` and `[!-- END name --]`. The payload is never
//! parsed as XML; regions are found by text search. A BEGIN closes at the
//! nearest END carrying the same name, and a BEGIN without such an END is
//! ignored.

use regex_lite::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Matches a BEGIN marker and captures the segment name
static BEGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[!--\sBEGIN\s(\S*)\s--\]").unwrap());

const OPEN: &str = "[!--";
const CLOSE: &str = "--]";

/// A matched BEGIN/END region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair<'a> {
    /// Segment name carried by both markers
    pub name: &'a str,
    /// Full region text, markers included
    pub outer: &'a str,
    /// Text between the markers
    pub inner: &'a str,
    /// Byte range of `outer` in the searched text
    pub range: Range<usize>,
}

/// Canonical BEGIN marker for `name`
pub fn begin_marker(name: &str) -> String {
    format!("[!-- BEGIN {} --]", name)
}

/// Canonical END marker for `name`
pub fn end_marker(name: &str) -> String {
    format!("[!-- END {} --]", name)
}

/// Outermost regions of any name, in document order.
///
/// Scanning resumes after each matched END, so regions nested inside a
/// match are not reported.
pub fn pairs(xml: &str) -> Vec<MarkerPair<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some((pair, resume)) = next_pair(xml, pos, |_| true) {
        pos = resume;
        found.push(pair);
    }
    found
}

/// First region whose name satisfies `accept`, nested or not
pub fn first_pair<'a>(xml: &'a str, accept: impl Fn(&str) -> bool) -> Option<MarkerPair<'a>> {
    next_pair(xml, 0, accept).map(|(pair, _)| pair)
}

/// First region named `name`
pub fn find_named<'a>(xml: &'a str, name: &str) -> Option<MarkerPair<'a>> {
    first_pair(xml, |candidate| candidate == name)
}

/// Replace every region named `name` by its inner text
pub fn unwrap_named(xml: &str, name: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut copied = 0;
    let mut pos = 0;
    while let Some((pair, _)) = next_pair(xml, pos, |candidate| candidate == name) {
        out.push_str(&xml[copied..pair.range.start]);
        out.push_str(pair.inner);
        copied = pair.range.end;
        pos = pair.range.end;
    }
    out.push_str(&xml[copied..]);
    out
}

/// Find the next complete region starting at or after `from`.
///
/// Returns the pair together with the position where a caller should
/// continue scanning.
fn next_pair<'a>(
    xml: &'a str,
    from: usize,
    accept: impl Fn(&str) -> bool,
) -> Option<(MarkerPair<'a>, usize)> {
    let mut pos = from;
    while pos <= xml.len() {
        let caps = BEGIN_RE.captures_at(xml, pos)?;
        let (whole, name) = match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(name)) => (whole, name.as_str()),
            _ => return None,
        };
        // '[' is a single byte, so this stays on a char boundary
        pos = whole.start() + 1;
        if !accept(name) {
            pos = whole.end();
            continue;
        }
        if let Some(end) = find_end(xml, whole.end(), name) {
            let pair = MarkerPair {
                name,
                outer: &xml[whole.start()..end.end],
                inner: &xml[whole.end()..end.start],
                range: whole.start()..end.end,
            };
            return Some((pair, end.end));
        }
    }
    None
}

/// Nearest END marker for `name` at or after `from`
fn find_end(xml: &str, from: usize, name: &str) -> Option<Range<usize>> {
    let mut search = from;
    while let Some(offset) = xml[search..].find(OPEN) {
        let start = search + offset;
        if let Some(len) = end_marker_len(&xml.as_bytes()[start..], name) {
            return Some(start..start + len);
        }
        search = start + 1;
    }
    None
}

/// Length of an END marker for `name` at the start of `text`.
///
/// Single whitespace characters separate the parts, as in
/// `[!--\sEND\sname\s--]`.
fn end_marker_len(text: &[u8], name: &str) -> Option<usize> {
    let rest = text.strip_prefix(OPEN.as_bytes())?;
    let rest = skip_space(rest)?.strip_prefix(b"END".as_slice())?;
    let rest = skip_space(rest)?.strip_prefix(name.as_bytes())?;
    let rest = skip_space(rest)?.strip_prefix(CLOSE.as_bytes())?;
    Some(text.len() - rest.len())
}

fn skip_space(text: &[u8]) -> Option<&[u8]> {
    match text.split_first() {
        Some((&byte, rest)) if is_space(byte) => Some(rest),
        _ => None,
    }
}

/// Whitespace as understood by `\s` in the marker syntax
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}
