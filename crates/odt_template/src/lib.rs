//! OpenDocument Text Templates
//!
//! This crate fills ODT templates with data. A template is an ordinary
//! `.odt` file whose text contains:
//!
//! - variables such as `{name}`, replaced by bound values
//! - segments delimited by `[!-- BEGIN rows --]` and `[!-- END rows --]`,
//!   repeated once per merged row and nestable
//! - `row.` segments (`[!-- BEGIN row.items --]`) inside a table row, which
//!   repeat the whole `<table:table-row>` instead of their own text
//! - image placeholders, variables bound to a picture frame
//!
//! # Features
//!
//! - Single-pass variable substitution with XML escaping and line breaks
//! - Nested segment discovery with per-row accumulation
//! - Image frames sized from PNG, JPEG, GIF, BMP and WebP headers
//! - Manifest bookkeeping for embedded pictures
//! - Custom document properties in `meta.xml`
//! - JSON-driven merges through [`MergeData`]
//!
//! # Example
//!
//! ```ignore
//! use odt_template::Document;
//!
//! let mut doc = Document::open("invoice.odt")?;
//! doc.bind_variable("client", "ACME & Sons")?;
//!
//! let items = doc.declare_segment("items")?;
//! for (name, price) in [("Paper", "4.50"), ("Ink", "12.00")] {
//!     items.bind_variable("name", name)?.bind_variable("price", price)?;
//!     items.merge()?;
//! }
//! doc.merge_segment("items")?;
//! doc.save_to_disk(Some("invoice-42.odt".as_ref()))?;
//! ```

mod config;
mod data;
mod document;
mod error;
mod segment;
mod working;
pub mod image;
pub mod manifest;
pub mod markers;
pub mod meta;
pub mod rows;
pub mod tokens;

// Re-export main types
pub use config::TemplateConfig;
pub use data::{ImageBinding, MergeData};
pub use document::Document;
pub use error::{OdfError, Result};
pub use image::{Anchor, EmbeddedImage, ImageFormat, ImageFrame, ImagePlacement, LengthUnit};
pub use segment::{MergeState, Segment, MAX_DEPTH};
pub use tokens::TokenStore;
pub use working::WorkingCopy;

pub use odt_archive::ODT_MIME_TYPE;
