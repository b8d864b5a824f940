//! Repeatable template segments.
//!
//! A segment is a named region of the document delimited by
//! `[!-- BEGIN name --]` and `[!-- END name --]`. Nested regions become
//! child segments, discovered once when the segment is built.
//!
//! A segment is filled row by row: bind its variables, call
//! [`Segment::merge`], bind the next row, merge again. Each merge appends
//! one expanded copy of the fragment to the segment output. Child rows are
//! merged the same way before their parent row; when the parent merges it
//! splices in whatever the children accumulated and resets them for the
//! next parent row.

use crate::error::{OdfError, Result};
use crate::image::{EmbeddedImage, ImageFrame, ImagePlacement};
use crate::markers;
use crate::tokens::{decode_charset, TokenStore};
use crate::working::Session;
use crate::TemplateConfig;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// Nesting depth at which segment discovery gives up
pub const MAX_DEPTH: usize = 64;

/// Whether a segment holds output its parent has not consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeState {
    /// Nothing pending; a parent merge expands the segment itself
    #[default]
    Drained,
    /// Merged rows are waiting for the parent
    Accumulating,
}

/// A named, repeatable region of the document
pub struct Segment {
    name: String,
    /// Fragment text, markers included
    source_xml: String,
    /// Expanded rows since the last drain
    accumulated: String,
    /// Children in order of discovery
    children: Vec<Segment>,
    tokens: TokenStore,
    /// Images bound on this segment, embedded on merge
    images: Vec<EmbeddedImage>,
    /// Picture files to list in the manifest, including merged children's
    manifest_images: Vec<String>,
    state: MergeState,
    session: Rc<Session>,
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("children", &self.children)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl Segment {
    /// Build a segment over `xml` that is not attached to a document.
    ///
    /// Images bound on such a segment are tracked but never copied
    /// anywhere.
    pub fn standalone(name: impl Into<String>, xml: impl Into<String>, config: TemplateConfig) -> Result<Self> {
        let session = Rc::new(Session::new(config, None));
        Self::parse(name.into(), xml.into(), session, 0)
    }

    pub(crate) fn parse(name: String, source_xml: String, session: Rc<Session>, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(OdfError::NestingTooDeep {
                name,
                limit: MAX_DEPTH,
            });
        }
        let mut children = Vec::new();
        discover_children(&name, &source_xml, &session, depth, &mut children)?;
        tracing::debug!(
            "Segment '{}' discovered with {} direct children",
            name,
            children.len()
        );
        Ok(Self {
            name,
            source_xml,
            accumulated: String::new(),
            children,
            tokens: TokenStore::new(),
            images: Vec::new(),
            manifest_images: Vec::new(),
            state: MergeState::Drained,
            session,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fragment text the segment was built from
    pub fn source_xml(&self) -> &str {
        &self.source_xml
    }

    /// Rows merged since the last drain
    pub fn output(&self) -> &str {
        &self.accumulated
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Bound variables of this segment
    pub fn variables(&self) -> &TokenStore {
        &self.tokens
    }

    /// Images bound on this segment
    pub fn images(&self) -> &[EmbeddedImage] {
        &self.images
    }

    /// Picture files collected for the manifest
    pub fn manifest_images(&self) -> &[String] {
        &self.manifest_images
    }

    pub(crate) fn take_manifest_images(&mut self) -> Vec<String> {
        std::mem::take(&mut self.manifest_images)
    }

    pub fn children(&self) -> &[Segment] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Direct child named `name`
    pub fn child(&self, name: &str) -> Result<&Segment> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| self.child_not_found(name))
    }

    /// Direct child named `name`, for binding
    pub fn child_mut(&mut self, name: &str) -> Result<&mut Segment> {
        match self.children.iter().position(|c| c.name == name) {
            Some(index) => Ok(&mut self.children[index]),
            None => Err(self.child_not_found(name)),
        }
    }

    fn child_not_found(&self, child: &str) -> OdfError {
        OdfError::ChildSegmentNotFound {
            segment: self.name.clone(),
            child: child.to_string(),
        }
    }

    /// Every nested segment, depth first, excluding this one
    pub fn descendants(&self) -> Vec<&Segment> {
        let mut found = Vec::new();
        for child in &self.children {
            found.push(child);
            found.extend(child.descendants());
        }
        found
    }

    /// Tag for `key` after checking it occurs in this fragment
    fn declared_tag(&self, key: &str) -> Result<String> {
        let tag = self.session.tag(key);
        if !TokenStore::declared_in(&tag, &[&self.source_xml]) {
            return Err(OdfError::SegmentVariableNotFound {
                segment: self.name.clone(),
                key: key.to_string(),
            });
        }
        Ok(tag)
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

    /// Bind an image frame to `key`
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

    /// Expand the current bindings as one more row.
    ///
    /// Children with pending rows are spliced in and reset; children with
    /// nothing pending are expanded once with their current bindings.
    /// Returns everything merged since the last drain.
    pub fn merge(&mut self) -> Result<&str> {
        // nothing is recorded for this row until its images are in place
        self.session.embed_images(&self.images)?;
        let mut row = self.tokens.apply(&self.source_xml)?;

        for child in &mut self.children {
            if child.state == MergeState::Drained {
                child.merge()?;
            }
            let child_output = child.drain();
            row = row.replace(&child.source_xml, &child_output);
            self.manifest_images.append(&mut child.manifest_images);
        }

        let row = markers::unwrap_named(&row, &self.name);
        self.accumulated.push_str(&row);
        self.state = MergeState::Accumulating;
        tracing::debug!("Merged row into segment '{}' ({} bytes)", self.name, self.accumulated.len());
        Ok(&self.accumulated)
    }

    /// Hand the pending output to the caller and reset
    fn drain(&mut self) -> String {
        self.state = MergeState::Drained;
        std::mem::take(&mut self.accumulated)
    }
}

/// Collect the children of segment `scope` found in `xml`.
///
/// The scan also meets the segment's own markers; their inner text is
/// scanned again instead of becoming a child.
fn discover_children(
    scope: &str,
    xml: &str,
    session: &Rc<Session>,
    depth: usize,
    children: &mut Vec<Segment>,
) -> Result<()> {
    for pair in markers::pairs(xml) {
        if pair.name == scope {
            // inner text is strictly shorter, so this terminates
            discover_children(scope, pair.inner, session, depth, children)?;
        } else if !children.iter().any(|c| c.name == pair.name) {
            let child = Segment::parse(
                pair.name.to_string(),
                pair.outer.to_string(),
                Rc::clone(session),
                depth + 1,
            )?;
            children.push(child);
        }
    }
    Ok(())
}
