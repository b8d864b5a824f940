//! ZIP-backed archive implementation.
//!
//! The `zip` crate cannot rewrite an archive in place, so the whole package
//! is loaded into memory on `open`, edited there, and written back on
//! `close` through a staging file in the same directory that replaces the
//! original in one rename.

use crate::archive::Archive;
use crate::error::{ArchiveError, ArchiveResult};
use crate::parts;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// One archive member held in memory
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

impl Entry {
    fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Compression used when writing the entry back.
    ///
    /// The package mimetype must stay stored; anything else that was not
    /// stored is rewritten deflated.
    fn write_method(&self) -> CompressionMethod {
        if self.name == parts::MIMETYPE {
            return CompressionMethod::Stored;
        }
        match self.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        }
    }
}

/// Archive over a ZIP package on disk
#[derive(Debug, Default)]
pub struct ZipFileArchive {
    /// Path of the open package, `None` when closed
    path: Option<PathBuf>,
    /// Members in archive order
    entries: Vec<Entry>,
    /// Whether anything changed since `open`
    dirty: bool,
}

/// Largest buffer reserved up front for one entry
const MAX_PREALLOC: u64 = 1 << 20;

/// Capacity to reserve for an entry whose header claims `declared` bytes.
///
/// The header size is not trusted beyond [`MAX_PREALLOC`]; the buffer
/// still grows to the real size while reading.
fn preallocation(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

impl ZipFileArchive {
    /// Create a closed archive handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the open package
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn ensure_open(&self) -> ArchiveResult<()> {
        if self.path.is_none() {
            return Err(ArchiveError::NotOpen);
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn read_entries(path: &Path) -> ArchiveResult<Vec<Entry>> {
        let file = File::open(path).map_err(|e| ArchiveError::open(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| ArchiveError::open(path, e))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::with_capacity(preallocation(file.size()));
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
            });
        }
        Ok(entries)
    }

    fn write_entries(&self, path: &Path) -> ArchiveResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;

        {
            let mut zip = ZipWriter::new(staged.as_file_mut());

            // mimetype must be the first member of an OpenDocument package
            let ordered = self
                .entries
                .iter()
                .filter(|e| e.name == parts::MIMETYPE)
                .chain(self.entries.iter().filter(|e| e.name != parts::MIMETYPE));

            for entry in ordered {
                let options = SimpleFileOptions::default().compression_method(entry.write_method());
                if entry.is_dir() {
                    zip.add_directory(entry.name.as_str(), options)?;
                    continue;
                }
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
            zip.finish()?;
        }

        staged.persist(path).map_err(|e| ArchiveError::Io(e.error))?;
        Ok(())
    }
}

impl Archive for ZipFileArchive {
    fn open(&mut self, path: &Path) -> ArchiveResult<()> {
        if let Some(current) = &self.path {
            return Err(ArchiveError::AlreadyOpen(current.clone()));
        }
        self.entries = Self::read_entries(path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        tracing::debug!("Opened archive {} ({} entries)", path.display(), self.entries.len());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.path.is_some()
    }

    fn contains(&self, name: &str) -> ArchiveResult<bool> {
        self.ensure_open()?;
        Ok(self.find(name).is_some())
    }

    fn entry_names(&self) -> ArchiveResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.entries.iter().map(|e| e.name.clone()).collect())
    }

    fn entry_bytes(&self, name: &str) -> ArchiveResult<Vec<u8>> {
        self.ensure_open()?;
        self.find(name)
            .map(|e| e.data.clone())
            .ok_or_else(|| ArchiveError::entry_not_found(name))
    }

    fn put_entry_bytes(&mut self, name: &str, data: Vec<u8>) -> ArchiveResult<()> {
        self.ensure_open()?;
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
            }),
        }
        self.dirty = true;
        Ok(())
    }

    fn close(&mut self) -> ArchiveResult<()> {
        let path = self.path.take().ok_or(ArchiveError::NotOpen)?;
        let result = if self.dirty {
            self.write_entries(&path)
        } else {
            Ok(())
        };
        if result.is_ok() {
            tracing::debug!("Closed archive {} (written: {})", path.display(), self.dirty);
        }
        self.entries.clear();
        self.dirty = false;
        result
    }
}
