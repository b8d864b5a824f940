//! Shared fixtures for template integration tests

#![allow(dead_code)]

use odt_archive::{parts, ODT_MIME_TYPE};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const META_ENTRY: &str =
    r#"<manifest:file-entry manifest:full-path="meta.xml" manifest:media-type="text/xml"/>"#;

/// Wrap body text in a content.xml document
pub fn content_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:text>{}</office:text></office:body></office:document-content>"#,
        body
    )
}

/// Wrap header text in a styles.xml document
pub fn styles_xml(header: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-styles><office:master-styles><style:header><text:p>{}</text:p></style:header></office:master-styles></office:document-styles>"#,
        header
    )
}

pub fn meta_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?><office:document-meta><office:meta><meta:user-defined meta:name="Client" meta:value-type="string">Nobody</meta:user-defined><meta:user-defined meta:name="Reviewed"/></office:meta></office:document-meta>"#.to_string()
}

pub fn manifest_xml() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <manifest:manifest xmlns:manifest=\"urn:oasis:names:tc:opendocument:xmlns:manifest:1.0\">\n\
         <manifest:file-entry manifest:full-path=\"/\" manifest:media-type=\"{}\"/>\n\
         <manifest:file-entry manifest:full-path=\"content.xml\" manifest:media-type=\"text/xml\"/>\n\
         {}\n\
         </manifest:manifest>",
        ODT_MIME_TYPE, META_ENTRY
    )
}

/// Write a template package from explicit payloads
pub fn write_package(path: &Path, entries: &[(&str, String)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file(parts::MIMETYPE, stored).unwrap();
    zip.write_all(ODT_MIME_TYPE.as_bytes()).unwrap();
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Template whose content body is `body` and whose header is `header`
pub fn template_with_header(dir: &TempDir, body: &str, header: &str) -> PathBuf {
    let path = dir.path().join("template.odt");
    write_package(
        &path,
        &[
            (parts::CONTENT, content_xml(body)),
            (parts::STYLES, styles_xml(header)),
            (parts::META, meta_xml()),
            (parts::MANIFEST, manifest_xml()),
        ],
    );
    path
}

pub fn template(dir: &TempDir, body: &str) -> PathBuf {
    template_with_header(dir, body, "")
}

/// Smallest PNG header the size reader accepts
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

pub fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, png(width, height)).unwrap();
    path
}

/// Entry names and bytes of a package
pub fn read_package(bytes: &[u8]) -> ZipArchive<Cursor<Vec<u8>>> {
    ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap()
}

pub fn entry_text(bytes: &[u8], name: &str) -> String {
    let mut archive = read_package(bytes);
    let mut text = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    read_package(bytes).file_names().map(str::to_string).collect()
}

/// Text between `<office:text>` and `</office:text>`
pub fn body(content: &str) -> &str {
    let start = content.find("<office:text>").unwrap() + "<office:text>".len();
    let end = content.find("</office:text>").unwrap();
    &content[start..end]
}
