//! Integration tests for the zip-backed archive

use odt_archive::{parts, Archive, ArchiveError, ZipFileArchive, ODT_MIME_TYPE};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn create_package(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("template.odt");
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file(parts::MIMETYPE, stored).unwrap();
    zip.write_all(ODT_MIME_TYPE.as_bytes()).unwrap();
    zip.add_directory("Pictures/", SimpleFileOptions::default()).unwrap();
    for (name, body) in [
        (parts::CONTENT, "<office:document-content>{a}</office:document-content>"),
        (parts::STYLES, "<office:document-styles/>"),
        (parts::META, "<office:document-meta/>"),
        (parts::MANIFEST, "<manifest:manifest/>"),
    ] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test]
fn test_reopen_cycle_keeps_every_entry() {
    let dir = TempDir::new().unwrap();
    let path = create_package(&dir);
    let mut archive = ZipFileArchive::new();

    for round in 0..3 {
        archive.open(&path).unwrap();
        let name = parts::picture(&format!("img{}.png", round));
        archive.put_entry_bytes(&name, vec![round as u8; 4]).unwrap();
        archive.close().unwrap();
    }

    archive.open(&path).unwrap();
    let names = archive.entry_names().unwrap();
    assert_eq!(names[0], parts::MIMETYPE);
    assert!(names.iter().any(|n| n == "Pictures/"));
    for round in 0..3u8 {
        let name = parts::picture(&format!("img{}.png", round));
        assert_eq!(archive.entry_bytes(&name).unwrap(), vec![round; 4]);
    }
    assert_eq!(archive.entry_text(parts::STYLES).unwrap(), "<office:document-styles/>");
    archive.close().unwrap();
}

#[test]
fn test_put_entry_file_copies_source_bytes() {
    let dir = TempDir::new().unwrap();
    let path = create_package(&dir);
    let source = dir.path().join("logo.gif");
    std::fs::write(&source, b"GIF89a-bytes").unwrap();

    let mut archive = ZipFileArchive::new();
    archive.open(&path).unwrap();
    archive.put_entry_file(&source, &parts::picture("logo.gif")).unwrap();
    archive.close().unwrap();

    archive.open(&path).unwrap();
    assert!(archive.contains("Pictures/logo.gif").unwrap());
    assert_eq!(archive.entry_bytes("Pictures/logo.gif").unwrap(), b"GIF89a-bytes");
    archive.close().unwrap();
}

#[test]
fn test_put_entry_file_missing_source() {
    let dir = TempDir::new().unwrap();
    let path = create_package(&dir);

    let mut archive = ZipFileArchive::new();
    archive.open(&path).unwrap();
    let result = archive.put_entry_file(Path::new("/no/such/image.png"), "Pictures/image.png");
    assert!(matches!(result, Err(ArchiveError::Io(_))));
    archive.close().unwrap();
}

#[test]
fn test_close_without_changes_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = create_package(&dir);
    let before = std::fs::read(&path).unwrap();

    let mut archive = ZipFileArchive::new();
    archive.open(&path).unwrap();
    let _ = archive.entry_text(parts::CONTENT).unwrap();
    archive.close().unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_close_twice_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = create_package(&dir);

    let mut archive = ZipFileArchive::new();
    archive.open(&path).unwrap();
    archive.close().unwrap();
    assert!(matches!(archive.close(), Err(ArchiveError::NotOpen)));
}
