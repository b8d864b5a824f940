//! Template documents.
//!
//! [`Document`] owns the payloads of an opened template, the document-level
//! variable bindings and the declared top-level segments. Segment output is
//! spliced back into the content payload by [`Document::merge_segment`];
//! document variables are substituted once, when the result is saved.

use crate::config::TemplateConfig;
use crate::error::{OdfError, Result};
use crate::image::{EmbeddedImage, ImageFrame, ImagePlacement};
use crate::manifest;
use crate::markers;
use crate::meta;
use crate::rows;
use crate::segment::Segment;
use crate::tokens::{decode_charset, escape_xml, TokenStore};
use crate::working::{Session, WorkingCopy};
use odt_archive::{parts, Archive};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// An opened ODT template
#[derive(Debug)]
pub struct Document {
    /// Template the document was opened from
    source: PathBuf,
    session: Rc<Session>,
    content: String,
    styles: String,
    meta: String,
    manifest: String,
    tokens: TokenStore,
    /// Declared top-level segments in order of declaration
    segments: Vec<Segment>,
    /// Images bound at document level, copied on save
    images: Vec<EmbeddedImage>,
    /// Picture files to list in the manifest
    manifest_images: Vec<String>,
}

impl Document {
    /// Open the template at `path` with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, TemplateConfig::default())
    }

    /// Open the template at `path`.
    ///
    /// The template is copied to a working file first; the original is
    /// only written by [`save_to_disk`](Self::save_to_disk) without a
    /// destination.
    pub fn open_with_config(path: impl AsRef<Path>, config: TemplateConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OdfError::DocumentNotFound(path.to_path_buf()));
        }
        let tmp_dir = config.validate()?;
        let working = WorkingCopy::create(path, &tmp_dir)?;

        let (content, styles, manifest, meta) = working.with_open(|archive| {
            Ok((
                read_payload(archive, parts::CONTENT)?,
                read_payload(archive, parts::STYLES)?,
                read_payload(archive, parts::MANIFEST)?,
                read_payload(archive, parts::META)?,
            ))
        })?;

        tracing::info!("Opened template {}", path.display());
        Ok(Self {
            source: path.to_path_buf(),
            session: Rc::new(Session::new(config, Some(working))),
            content: rows::normalize_rows(&content),
            styles,
            meta,
            manifest,
            tokens: TokenStore::new(),
            segments: Vec::new(),
            images: Vec::new(),
            manifest_images: Vec::new(),
        })
    }

    /// Template path
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.session.config
    }

    /// Current content.xml text
    pub fn content_xml(&self) -> &str {
        &self.content
    }

    /// Current styles.xml text
    pub fn styles_xml(&self) -> &str {
        &self.styles
    }

    /// Current meta.xml text
    pub fn meta_xml(&self) -> &str {
        &self.meta
    }

    /// Current manifest text
    pub fn manifest_xml(&self) -> &str {
        &self.manifest
    }

    /// Document-level variable bindings
    pub fn variables(&self) -> &TokenStore {
        &self.tokens
    }

    /// Names of declared segments, in order of declaration
    pub fn declared_segments(&self) -> Vec<&str> {
        self.segments.iter().map(Segment::name).collect()
    }

    /// Tag for `key` after checking it occurs in content or styles
    fn declared_tag(&self, key: &str) -> Result<String> {
        let tag = self.session.tag(key);
        if !TokenStore::declared_in(&tag, &[&self.content, &self.styles]) {
            return Err(OdfError::TokenNotDeclared(key.to_string()));
        }
        Ok(tag)
    }

    /// Whether the tag for `key` occurs in content.xml
    pub fn variable_exists(&self, key: &str) -> bool {
        TokenStore::declared_in(&self.session.tag(key), &[&self.content])
    }

    /// Bind a variable, escaping XML special characters
    pub fn bind_variable(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.bind_variable_with(key, value, true)
    }

    /// Bind a variable whose value is inserted as markup
    pub fn bind_raw_variable(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.bind_variable_with(key, value, false)
    }

    /// Bind a variable, escaping only when `encode` is set
    pub fn bind_variable_with(&mut self, key: &str, value: &str, encode: bool) -> Result<&mut Self> {
        let tag = self.declared_tag(key)?;
        self.tokens.bind(tag, value, encode);
        Ok(self)
    }

    /// Bind a variable given as bytes in `charset`
    pub fn bind_variable_bytes(&mut self, key: &str, value: &[u8], encode: bool, charset: &str) -> Result<&mut Self> {
        let tag = self.declared_tag(key)?;
        let value = decode_charset(value, charset)?;
        self.tokens.bind(tag, &value, encode);
        Ok(self)
    }

    /// Bind an image frame to `key`; the image is copied on save
    pub fn bind_image(&mut self, key: &str, path: &Path, placement: ImagePlacement) -> Result<&mut Self> {
        let tag = self.declared_tag(key)?;
        let frame = ImageFrame::build(path, &placement)?;
        self.manifest_images.push(frame.image.file.clone());
        if !self.images.iter().any(|image| image.source == frame.image.source) {
            self.images.push(frame.image);
        }
        self.tokens.bind(tag, &frame.xml, false);
        Ok(self)
    }

    /// Whether a segment named `name` occurs in content.xml
    pub fn segment_exists(&self, name: &str) -> bool {
        markers::find_named(&self.content, name).is_some()
    }

    /// Declared segment named `name`
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name() == name)
    }

    /// Build the segment named `name`, or return the one already built
    pub fn declare_segment(&mut self, name: &str) -> Result<&mut Segment> {
        if let Some(index) = self.segments.iter().position(|s| s.name() == name) {
            return Ok(&mut self.segments[index]);
        }
        let pair = markers::find_named(&self.content, name)
            .ok_or_else(|| OdfError::SegmentNotFound(name.to_string()))?;
        let segment = Segment::parse(
            name.to_string(),
            pair.outer.to_string(),
            Rc::clone(&self.session),
            0,
        )?;
        tracing::debug!("Declared segment '{}'", name);
        self.segments.push(segment);
        let index = self.segments.len() - 1;
        Ok(&mut self.segments[index])
    }

    /// Replace the first region named `name` with the segment output
    pub fn merge_segment(&mut self, name: &str) -> Result<&mut Self> {
        let index = self
            .segments
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| OdfError::SegmentNotDeclared(name.to_string()))?;
        let range = markers::find_named(&self.content, name)
            .map(|pair| pair.range)
            .ok_or_else(|| OdfError::SegmentNotFound(name.to_string()))?;

        let segment = &mut self.segments[index];
        self.content.replace_range(range, segment.output());
        self.manifest_images.extend(segment.take_manifest_images());
        tracing::debug!("Merged segment '{}' into content", name);
        Ok(self)
    }

    /// Whether meta.xml has a custom property named `key`.
    ///
    /// Unparsable meta.xml is logged and reported as having no properties.
    pub fn custom_property_exists(&self, key: &str) -> bool {
        meta::property_exists(&self.meta, key).unwrap_or_else(|e| {
            tracing::warn!("Failed to read custom properties from meta.xml: {}", e);
            false
        })
    }

    /// Set an existing custom property and write meta.xml to the working copy
    pub fn set_custom_property(&mut self, key: &str, value: &str, encode: bool) -> Result<&mut Self> {
        let value = if encode {
            escape_xml(value)
        } else {
            value.to_string()
        };
        self.meta = meta::set_property(&self.meta, key, &value)?
            .ok_or_else(|| OdfError::CustomPropertyNotFound(key.to_string()))?;

        let meta_xml = &self.meta;
        self.session
            .working()?
            .with_open(|archive| Ok(archive.put_entry_text(parts::META, meta_xml)?))?;
        Ok(self)
    }

    /// Substitute document variables and write every payload and image
    /// into the working copy
    fn finalize(&mut self) -> Result<()> {
        self.tokens.apply_all(&mut [&mut self.content, &mut self.styles])?;
        self.manifest = manifest::add_pictures(&self.manifest, &self.manifest_images)?;

        let (content, styles, manifest, images) = (&self.content, &self.styles, &self.manifest, &self.images);
        self.session
            .working()?
            .with_open(|archive| {
                archive.put_entry_text(parts::CONTENT, content)?;
                archive.put_entry_text(parts::STYLES, styles)?;
                archive.put_entry_text(parts::MANIFEST, manifest)?;
                for image in images {
                    archive.put_entry_file(&image.source, &image.entry_name())?;
                }
                Ok(())
            })
            .map_err(|e| match e {
                OdfError::Archive(e) => OdfError::serialization(e.to_string()),
                other => other,
            })
    }

    /// Save the merged document to `destination`, or over the template
    pub fn save_to_disk(&mut self, destination: Option<&Path>) -> Result<()> {
        self.finalize()?;
        let destination = destination.unwrap_or(&self.source);
        let working = self.session.working()?;
        std::fs::copy(working.path(), destination)
            .map_err(|e| OdfError::serialization(format!("{}: {}", destination.display(), e)))?;
        tracing::info!("Saved document to {}", destination.display());
        Ok(())
    }

    /// The merged document as ODT bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;
        self.session.working()?.read_bytes()
    }

    /// Write the merged document to `writer`
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Read a required payload from the archive
fn read_payload(archive: &mut dyn Archive, name: &str) -> Result<String> {
    if !archive.contains(name)? {
        return Err(OdfError::MissingArchiveEntry(name.to_string()));
    }
    Ok(archive.entry_text(name)?)
}
