//! In-memory presentation model.
//!
//! A `Deck` is an ordered list of `Slide`s, each a flat list of absolutely
//! positioned shapes (filled rectangles, text boxes, pictures). Geometry is in
//! EMU, the unit OOXML uses, so `io::export` can write it out unchanged.
//! Images are stored once on the deck and referenced by `MediaId`, which lets
//! the logo be shared by every slide.

use std::io::Cursor;
use std::str::FromStr;

use image::{GenericImageView, ImageFormat};

pub mod geometry;

pub use geometry::*;

/// 24-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `RRGGBB`, the form DrawingML's `srgbClr` expects.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid color '{s}'. Expected #RRGGBB."));
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// A styled span of text, optionally hyperlinked.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Font size in points.
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Rgb>,
    pub font: Option<String>,
    pub link: Option<String>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            size,
            bold: false,
            italic: false,
            color: None,
            font: None,
            link: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn colored(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn linked(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchoring of text inside its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Anchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub align: Align,
    pub bullet: bool,
    /// Align with bulleted text without drawing a bullet.
    pub indented: bool,
    /// Extra space above the paragraph, in points.
    pub space_before: f32,
}

impl Paragraph {
    pub fn new(runs: impl Into<Vec<TextRun>>) -> Self {
        Self {
            runs: runs.into(),
            ..Self::default()
        }
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_bullet(mut self) -> Self {
        self.bullet = true;
        self
    }

    pub fn with_indent(mut self) -> Self {
        self.indented = true;
        self
    }

    pub fn with_space_before(mut self, points: f32) -> Self {
        self.space_before = points;
        self
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub name: String,
    pub frame: Frame,
    pub paragraphs: Vec<Paragraph>,
    pub fill: Option<Rgb>,
    pub anchor: Anchor,
}

impl TextBox {
    pub fn new(name: impl Into<String>, frame: Frame) -> Self {
        Self {
            name: name.into(),
            frame,
            paragraphs: Vec::new(),
            fill: None,
            anchor: Anchor::Top,
        }
    }

    pub fn with_paragraph(mut self, paragraph: Paragraph) -> Self {
        self.paragraphs.push(paragraph);
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }
}

/// Index of an image stored on the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub name: String,
    pub frame: Frame,
    pub media: MediaId,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { name: String, frame: Frame, fill: Rgb },
    Text(TextBox),
    Picture(Picture),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slide {
    pub title: String,
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            shapes: Vec::new(),
        }
    }

    pub fn add(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Every paragraph on the slide as plain text, in shape order.
    pub fn texts(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text(tb) => Some(tb.paragraphs.iter().map(Paragraph::text)),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Finds the text box with the given shape name.
    pub fn text_box(&self, name: &str) -> Option<&TextBox> {
        self.shapes.iter().find_map(|shape| match shape {
            Shape::Text(tb) if tb.name == name => Some(tb),
            _ => None,
        })
    }

    pub fn pictures(&self) -> impl Iterator<Item = &Picture> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Picture(p) => Some(p),
            _ => None,
        })
    }

    /// Distinct hyperlink targets in order of first use.
    pub fn links(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for shape in &self.shapes {
            if let Shape::Text(tb) = shape {
                for run in tb.paragraphs.iter().flat_map(|p| p.runs.iter()) {
                    if let Some(link) = run.link.as_deref() {
                        if !out.contains(&link) {
                            out.push(link);
                        }
                    }
                }
            }
        }
        out
    }
}

/// Image encodings that can be embedded as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Png,
    Jpeg,
    Gif,
}

impl MediaFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Png => "png",
            MediaFormat::Jpeg => "jpeg",
            MediaFormat::Gif => "gif",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaFormat::Png => "image/png",
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Gif => "image/gif",
        }
    }
}

/// A decoded-and-verified image ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub format: MediaFormat,
    pub width_px: u32,
    pub height_px: u32,
}

impl Media {
    /// Decode `bytes` to validate them and read the pixel size. Formats other
    /// than PNG/JPEG/GIF are re-encoded to PNG.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width_px, height_px) = decoded.dimensions();

        let (bytes, format) = match format {
            ImageFormat::Png => (bytes, MediaFormat::Png),
            ImageFormat::Jpeg => (bytes, MediaFormat::Jpeg),
            ImageFormat::Gif => (bytes, MediaFormat::Gif),
            _ => {
                let mut out = Cursor::new(Vec::new());
                decoded.write_to(&mut out, ImageFormat::Png)?;
                (out.into_inner(), MediaFormat::Png)
            }
        };

        Ok(Self {
            bytes,
            format,
            width_px,
            height_px,
        })
    }
}

/// A whole presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub title: String,
    pub width: i64,
    pub height: i64,
    slides: Vec<Slide>,
    media: Vec<Media>,
}

impl Deck {
    /// A 10in x 7.5in (4:3) deck.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: SLIDE_WIDTH,
            height: SLIDE_HEIGHT,
            slides: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn push_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Decode and store an image, returning its handle.
    pub fn add_media(&mut self, bytes: Vec<u8>) -> Result<MediaId, image::ImageError> {
        let media = Media::decode(bytes)?;
        Ok(self.insert_media(media))
    }

    pub fn insert_media(&mut self, media: Media) -> MediaId {
        self.media.push(media);
        MediaId(self.media.len() - 1)
    }

    pub fn media(&self, id: MediaId) -> Option<&Media> {
        self.media.get(id.0)
    }

    pub fn media_items(&self) -> &[Media] {
        &self.media
    }
}

/// Solid-color PNG for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::ImageBuffer::from_pixel(width, height, image::Rgba([10u8, 20, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_parses_hex_with_or_without_hash() {
        assert_eq!("#1F3864".parse::<Rgb>().unwrap(), Rgb::new(0x1F, 0x38, 0x64));
        assert_eq!("ffffff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#GGGGGG".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(1, 2, 255).hex(), "0102FF");
    }

    #[test]
    fn media_decode_reads_dimensions() {
        let media = Media::decode(png_fixture(40, 20)).unwrap();
        assert_eq!(media.format, MediaFormat::Png);
        assert_eq!((media.width_px, media.height_px), (40, 20));
    }

    #[test]
    fn media_decode_rejects_garbage() {
        assert!(Media::decode(b"<html>not an image</html>".to_vec()).is_err());
    }

    #[test]
    fn slide_collects_texts_and_distinct_links() {
        let mut slide = Slide::new("t");
        let tb = TextBox::new("Body", Frame::new(0, 0, 10, 10))
            .with_paragraph(Paragraph::new(vec![
                TextRun::new("a", 12.0).linked(Some("http://x".into())),
                TextRun::new("b", 12.0),
            ]))
            .with_paragraph(Paragraph::new(vec![
                TextRun::new("c", 12.0).linked(Some("http://x".into())),
            ]));
        slide.add(Shape::Text(tb));
        assert_eq!(slide.texts(), vec!["ab".to_string(), "c".to_string()]);
        assert_eq!(slide.links(), vec!["http://x"]);
    }
}
