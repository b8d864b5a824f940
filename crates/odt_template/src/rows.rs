//! Table row segments.
//!
//! Word processors make it hard to put text outside a table row, so a
//! repeatable row is marked with a `row.NAME` segment placed inside one of
//! its cells. Before segment discovery the inner markers are removed and
//! the whole `<table:table-row>` element is wrapped in `NAME` markers
//! instead.

use crate::markers;
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

/// Prefix identifying a row segment
pub const ROW_PREFIX: &str = "row.";

/// Matches one table row, from its start tag to the nearest end tag
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<table:table-row(?:\s[^>]*)?>.*?</table:table-row>").unwrap()
});

/// Segment name wrapped around the row for a `row.NAME` marker
fn row_target(name: &str) -> Option<&str> {
    name.strip_prefix(ROW_PREFIX).filter(|rest| !rest.is_empty())
}

/// Move `row.NAME` markers from inside table rows onto the rows.
///
/// Rows without such markers are left alone, so the pass is a no-op on
/// text it has already processed.
pub fn normalize_rows(content: &str) -> String {
    let normalized = ROW_RE.replace_all(content, |caps: &Captures<'_>| {
        let row = caps.get(0).map_or("", |m| m.as_str());
        normalize_row(row).unwrap_or_else(|| row.to_string())
    });
    normalized.into_owned()
}

/// Rewrite one row, or `None` when it carries no row marker
fn normalize_row(row: &str) -> Option<String> {
    let pair = markers::first_pair(row, |name| row_target(name).is_some())?;
    let target = row_target(pair.name)?;
    tracing::debug!("Moving segment markers '{}' onto table row", pair.name);

    let stripped = markers::unwrap_named(row, pair.name);
    Some(format!(
        "{}{}{}",
        markers::begin_marker(target),
        stripped,
        markers::end_marker(target)
    ))
}
