//! JSON-driven merges.
//!
//! [`MergeData`] describes a whole merge as data:
//!
//! ```json
//! {
//!   "variables": { "title": "Catalogue" },
//!   "images": { "logo": "logo.png" },
//!   "segments": {
//!     "categories": [
//!       { "variables": { "name": "Books" },
//!         "segments": { "articles": [ { "variables": { "title": "Dune" } } ] } }
//!     ]
//!   }
//! }
//! ```
//!
//! Each segment row has the same shape as the document itself. Child rows
//! are merged before the row that contains them.

use crate::document::Document;
use crate::error::Result;
use crate::image::ImagePlacement;
use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An image given either as a bare path or with a placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageBinding {
    Path(PathBuf),
    Placed {
        path: PathBuf,
        #[serde(default)]
        placement: ImagePlacement,
    },
}

impl ImageBinding {
    pub fn path(&self) -> &Path {
        match self {
            Self::Path(path) | Self::Placed { path, .. } => path,
        }
    }

    pub fn placement(&self) -> ImagePlacement {
        match self {
            Self::Path(_) => ImagePlacement::default(),
            Self::Placed { placement, .. } => *placement,
        }
    }

    fn path_mut(&mut self) -> &mut PathBuf {
        match self {
            Self::Path(path) | Self::Placed { path, .. } => path,
        }
    }
}

/// Values for one document or one segment row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeData {
    pub variables: BTreeMap<String, Value>,
    pub images: BTreeMap<String, ImageBinding>,
    /// Rows per segment name, merged in order
    pub segments: BTreeMap<String, Vec<MergeData>>,
}

/// Text bound for a JSON value; `null` binds as an empty string
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl MergeData {
    /// Parse merge data from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load merge data from a JSON file.
    ///
    /// Relative image paths are taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut data = Self::from_json_str(&content)?;
        if let Some(base) = path.parent() {
            data.rebase_images(base);
        }
        tracing::debug!("Loaded merge data from {}", path.display());
        Ok(data)
    }

    fn rebase_images(&mut self, base: &Path) {
        for image in self.images.values_mut() {
            let path = image.path_mut();
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        for rows in self.segments.values_mut() {
            for row in rows {
                row.rebase_images(base);
            }
        }
    }

    /// Bind everything into `doc` and splice each top-level segment
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        for (key, value) in &self.variables {
            doc.bind_variable(key, &value_text(value))?;
        }
        for (key, image) in &self.images {
            doc.bind_image(key, image.path(), image.placement())?;
        }
        for (name, rows) in &self.segments {
            let segment = doc.declare_segment(name)?;
            for row in rows {
                row.merge_row(segment)?;
            }
            doc.merge_segment(name)?;
        }
        Ok(())
    }

    /// Bind this row into `segment`, fill its children, then merge
    fn merge_row(&self, segment: &mut Segment) -> Result<()> {
        for (key, value) in &self.variables {
            segment.bind_variable(key, &value_text(value))?;
        }
        for (key, image) in &self.images {
            segment.bind_image(key, image.path(), image.placement())?;
        }
        for (name, rows) in &self.segments {
            let child = segment.child_mut(name)?;
            for row in rows {
                row.merge_row(child)?;
            }
        }
        segment.merge()?;
        Ok(())
    }
}
