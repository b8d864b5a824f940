//! Working copy of an opened template.
//!
//! The template is copied into the temporary directory on open. Segment
//! images, property updates and the final payloads are written into that
//! copy, which is removed when the document is dropped.

use crate::config::TemplateConfig;
use crate::error::{OdfError, Result};
use crate::image::EmbeddedImage;
use odt_archive::{Archive, ZipFileArchive};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use tempfile::NamedTempFile;

/// Temporary package file and the archive used to edit it
pub struct WorkingCopy {
    file: NamedTempFile,
    archive: RefCell<Box<dyn Archive>>,
}

impl fmt::Debug for WorkingCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingCopy")
            .field("path", &self.file.path())
            .finish_non_exhaustive()
    }
}

impl WorkingCopy {
    /// Copy `template` into `tmp_dir`
    pub fn create(template: &Path, tmp_dir: &Path) -> Result<Self> {
        Self::with_archive(template, tmp_dir, Box::new(ZipFileArchive::new()))
    }

    /// Copy `template` into `tmp_dir`, editing it through `archive`
    pub fn with_archive(template: &Path, tmp_dir: &Path, archive: Box<dyn Archive>) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("odt-merge-")
            .suffix(".odt")
            .tempfile_in(tmp_dir)?;
        std::fs::copy(template, file.path())?;
        tracing::debug!("Working copy of {} at {}", template.display(), file.path().display());
        Ok(Self {
            file,
            archive: RefCell::new(archive),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open the archive, run `f` on it and close it again.
    ///
    /// The archive is closed even when `f` fails.
    pub fn with_open<T>(&self, f: impl FnOnce(&mut dyn Archive) -> Result<T>) -> Result<T> {
        let mut archive = self
            .archive
            .try_borrow_mut()
            .map_err(|_| OdfError::serialization("working copy is already open"))?;
        archive
            .open(self.path())
            .map_err(|e| OdfError::archive_open(self.path(), e))?;
        let result = f(&mut **archive);
        let closed = archive.close();
        let value = result?;
        closed.map_err(|e| OdfError::serialization(e.to_string()))?;
        Ok(value)
    }

    /// Copy images into `Pictures/`, skipping entries that already exist
    pub fn embed_images(&self, images: &[EmbeddedImage]) -> Result<()> {
        if images.is_empty() {
            return Ok(());
        }
        self.with_open(|archive| {
            for image in images {
                let entry = image.entry_name();
                if archive.contains(&entry)? {
                    continue;
                }
                tracing::debug!("Embedding {} as {}", image.source.display(), entry);
                archive.put_entry_file(&image.source, &entry)?;
            }
            Ok(())
        })
    }

    /// Current bytes of the working copy
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.path())?)
    }
}

/// State shared by a document and its segments
#[derive(Debug)]
pub(crate) struct Session {
    pub config: TemplateConfig,
    /// `None` for segments built without a package
    pub working: Option<WorkingCopy>,
}

impl Session {
    pub fn new(config: TemplateConfig, working: Option<WorkingCopy>) -> Self {
        Self { config, working }
    }

    pub fn tag(&self, key: &str) -> String {
        self.config.tag(key)
    }

    pub fn working(&self) -> Result<&WorkingCopy> {
        self.working
            .as_ref()
            .ok_or_else(|| OdfError::serialization("no working copy for this document"))
    }

    pub fn embed_images(&self, images: &[EmbeddedImage]) -> Result<()> {
        match &self.working {
            Some(working) => working.embed_images(images),
            None => Ok(()),
        }
    }
}
