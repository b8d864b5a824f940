//! META-INF/manifest.xml bookkeeping
//!
//! Every picture copied into the package needs a `manifest:file-entry`.
//! New entries go right after the `meta.xml` entry, or before the closing
//! root tag when the manifest has no such line.

use crate::error::Result;
use crate::tokens::escape_xml;
use odt_archive::parts;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;

/// Entry that new picture entries follow
const META_ENTRY: &str =
    r#"<manifest:file-entry manifest:full-path="meta.xml" manifest:media-type="text/xml"/>"#;

const MANIFEST_END: &str = "</manifest:manifest>";

/// Media type recorded for a picture, from its file extension
pub fn media_type(file: &str) -> String {
    let ext = file.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    format!("image/{}", ext)
}

/// `manifest:full-path` of every entry already listed
pub fn entry_paths(manifest: &str) -> Result<HashSet<String>> {
    let mut paths = HashSet::new();
    let mut reader = Reader::from_str(manifest);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.name().as_ref() == b"manifest:file-entry" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"manifest:full-path" {
                            paths.insert(attr.unescape_value()?.into_owned());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paths)
}

/// File entry line for a picture
fn picture_entry(file: &str) -> String {
    format!(
        r#"<manifest:file-entry manifest:media-type="{}" manifest:full-path="{}"/>"#,
        escape_xml(&media_type(file)),
        escape_xml(&parts::picture(file))
    )
}

/// Add entries for `files` that the manifest does not list yet
pub fn add_pictures(manifest: &str, files: &[String]) -> Result<String> {
    let mut known = entry_paths(manifest)?;
    let mut entries = String::new();
    for file in files {
        if known.insert(parts::picture(file)) {
            entries.push_str(&picture_entry(file));
            entries.push('\n');
        }
    }
    if entries.is_empty() {
        return Ok(manifest.to_string());
    }

    if let Some(pos) = manifest.find(META_ENTRY) {
        let at = pos + META_ENTRY.len();
        return Ok(format!("{}\n{}{}", &manifest[..at], entries, &manifest[at..]));
    }
    tracing::debug!("Manifest has no meta.xml entry, appending pictures before the root end tag");
    let at = manifest.rfind(MANIFEST_END).unwrap_or(manifest.len());
    Ok(format!("{}{}{}", &manifest[..at], entries, &manifest[at..]))
}
