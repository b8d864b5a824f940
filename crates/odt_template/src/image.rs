//! Embedded picture frames.
//!
//! An image variable is replaced by a `draw:frame` element pointing at a
//! file under `Pictures/`. The frame size is either given by the caller or
//! derived from the pixel size read from the image header.

use crate::error::{OdfError, Result};
use crate::tokens::escape_xml;
use odt_archive::parts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Centimetres per pixel at 96 dpi
pub const PIXEL_TO_CM: f64 = 0.026458333;

/// Millimetres per pixel at 96 dpi
pub const PIXEL_TO_MM: f64 = 25.4 / 96.0;

/// Image formats whose pixel size can be read from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
}

impl ImageFormat {
    /// Detect format from magic bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF: 47 49 46 38
        if data.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
            return Some(Self::Gif);
        }

        // WebP: 52 49 46 46 ... 57 45 42 50
        if data.len() >= 12 && data.starts_with(&[0x52, 0x49, 0x46, 0x46]) && &data[8..12] == b"WEBP"
        {
            return Some(Self::WebP);
        }

        // BMP: 42 4D
        if data.starts_with(&[0x42, 0x4D]) {
            return Some(Self::Bmp);
        }

        None
    }

    /// Pixel size stored in the image header
    pub fn dimensions(&self, data: &[u8]) -> Option<(u32, u32)> {
        let size = match self {
            Self::Png => png_dimensions(data),
            Self::Jpeg => jpeg_dimensions(data),
            Self::Gif => gif_dimensions(data),
            Self::WebP => webp_dimensions(data),
            Self::Bmp => bmp_dimensions(data),
        }?;
        (size.0 > 0 && size.1 > 0).then_some(size)
    }
}

fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // IHDR: width at 16, height at 20
    let width = u32::from_be_bytes(data.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(data.get(20..24)?.try_into().ok()?);
    Some((width, height))
}

fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        // SOFn, excluding DHT (C4), JPG (C8) and DAC (CC)
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Some((width, height));
        }
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}

fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let width = u16::from_le_bytes(data.get(6..8)?.try_into().ok()?) as u32;
    let height = u16::from_le_bytes(data.get(8..10)?.try_into().ok()?) as u32;
    Some((width, height))
}

fn bmp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let width = i32::from_le_bytes(data.get(18..22)?.try_into().ok()?);
    // Height is negative for top-down bitmaps
    let height = i32::from_le_bytes(data.get(22..26)?.try_into().ok()?);
    Some((width.unsigned_abs(), height.unsigned_abs()))
}

fn webp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    match data.get(12..16)? {
        b"VP8 " => {
            let width = u16::from_le_bytes(data.get(26..28)?.try_into().ok()?) & 0x3FFF;
            let height = u16::from_le_bytes(data.get(28..30)?.try_into().ok()?) & 0x3FFF;
            Some((width as u32, height as u32))
        }
        b"VP8L" => {
            let bits = u32::from_le_bytes(data.get(21..25)?.try_into().ok()?);
            Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        b"VP8X" => {
            let b = data.get(24..30)?;
            let width = u32::from_le_bytes([b[0], b[1], b[2], 0]) + 1;
            let height = u32::from_le_bytes([b[3], b[4], b[5], 0]) + 1;
            Some((width, height))
        }
        _ => None,
    }
}

/// Pixel size of the image stored at `path`
pub fn read_pixel_size(path: &Path) -> Result<(u32, u32)> {
    let data = std::fs::read(path).map_err(|e| OdfError::invalid_image(path, e.to_string()))?;
    let format = ImageFormat::from_bytes(&data)
        .ok_or_else(|| OdfError::invalid_image(path, "unknown image format"))?;
    format
        .dimensions(&data)
        .ok_or_else(|| OdfError::invalid_image(path, format!("unreadable {:?} header", format)))
}

/// Where a frame is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Flows with the text like a character
    #[default]
    AsChar,
    /// Fixed on a page, positioned by the offsets
    Page(u32),
}

/// Unit of the sizes and offsets given for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Centimeter,
    Millimeter,
    /// Pixels at 96 dpi, written out as millimetres
    Pixel,
}

impl LengthUnit {
    /// Unit suffix written in the frame attributes
    fn suffix(&self) -> &'static str {
        match self {
            Self::Centimeter => "cm",
            Self::Millimeter | Self::Pixel => "mm",
        }
    }

    /// Attribute value for a length given in this unit
    fn format(&self, value: f64) -> String {
        match self {
            Self::Centimeter => trim_decimal(value),
            Self::Millimeter => format!("{:.2}", value),
            Self::Pixel => format!("{:.2}", value * PIXEL_TO_MM),
        }
    }

    /// Length of `pixels` expressed in this unit
    fn from_pixels(&self, pixels: u32) -> f64 {
        let pixels = pixels as f64;
        match self {
            Self::Centimeter => pixels * PIXEL_TO_CM,
            Self::Millimeter => pixels * PIXEL_TO_MM,
            Self::Pixel => pixels,
        }
    }
}

/// Format with at most seven decimals and no trailing zeros.
///
/// Lengths are rounded to seven decimals, so a 40 px image is written as
/// `1.0583333` rather than the unrounded `1.05833332`. Frame text is
/// therefore not byte-identical to writers that print the full float.
fn trim_decimal(value: f64) -> String {
    let text = format!("{:.7}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Anchor, size and offset of an image frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePlacement {
    pub anchor: Anchor,
    /// Explicit width and height, original size when `None`
    pub size: Option<(f64, f64)>,
    /// Horizontal and vertical offset, used for page anchors only
    pub offset: (f64, f64),
    pub unit: LengthUnit,
}

impl ImagePlacement {
    /// Inline image at its original size
    pub fn as_char() -> Self {
        Self::default()
    }

    /// Image anchored on page `page`
    pub fn on_page(page: u32) -> Self {
        Self {
            anchor: Anchor::Page(page),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn in_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = unit;
        self
    }
}

/// An image to copy into the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Image on disk
    pub source: PathBuf,
    /// File name under `Pictures/`
    pub file: String,
}

impl EmbeddedImage {
    /// Entry name inside the package
    pub fn entry_name(&self) -> String {
        parts::picture(&self.file)
    }
}

/// A frame ready to be bound as a variable
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub image: EmbeddedImage,
    /// Frame XML
    pub xml: String,
}

impl ImageFrame {
    /// Read the image at `path` and build its frame
    pub fn build(path: &Path, placement: &ImagePlacement) -> Result<Self> {
        let file = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OdfError::invalid_image(path, "path has no file name"))?
            .to_string();
        let (px_width, px_height) = read_pixel_size(path)?;

        let unit = placement.unit;
        let (width, height) = placement
            .size
            .unwrap_or_else(|| (unit.from_pixels(px_width), unit.from_pixels(px_height)));

        let name = file.split('.').next().unwrap_or_default();
        let anchor = match placement.anchor {
            Anchor::AsChar => r#"text:anchor-type="as-char""#.to_string(),
            Anchor::Page(page) => format!(
                r#"text:anchor-type="page" text:anchor-page-number="{}" svg:x="{}{}" svg:y="{}{}""#,
                page,
                unit.format(placement.offset.0),
                unit.suffix(),
                unit.format(placement.offset.1),
                unit.suffix()
            ),
        };

        let xml = format!(
            r#"<draw:frame draw:style-name="fr1" draw:name="{}" {} svg:width="{}{}" svg:height="{}{}" draw:z-index="3"><draw:image xlink:href="{}" xlink:type="simple" xlink:show="embed" xlink:actuate="onLoad"/></draw:frame>"#,
            escape_xml(name),
            anchor,
            unit.format(width),
            unit.suffix(),
            unit.format(height),
            unit.suffix(),
            escape_xml(&parts::picture(&file)),
        );

        Ok(Self {
            image: EmbeddedImage {
                source: path.to_path_buf(),
                file,
            },
            xml,
        })
    }
}
