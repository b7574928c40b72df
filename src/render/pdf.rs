//! Page-description renderer: fixed-size pages via lopdf.
//!
//! Layout is deliberately simple: US-Letter pages, a Helvetica stack,
//! greedy line wrapping by estimated glyph width, headings sized by level.
//! JPEG images embed as DCTDecode XObjects; other raster formats are
//! re-encoded to JPEG first. Anything the layout engine raises surfaces
//! verbatim as a render error.

use std::io::Cursor;

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use tracing::warn;

use crate::doc::{Block, Package, block_text};
use crate::embed::ImageTable;
use crate::error::{Error, Result};

use super::{RenderOptions, Renderer};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 14.0;
const PARAGRAPH_GAP: f32 = 7.0;
const HEADING_GAP: f32 = 10.0;
const IMAGE_GAP: f32 = 8.0;

/// Approximate average glyph width as a fraction of the font size, used for
/// line wrapping without font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 20.0,
        2 => 17.0,
        3 => 15.0,
        4 => 13.0,
        5 => 12.0,
        _ => 11.0,
    }
}

pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn render(
        &self,
        package: &Package,
        images: &ImageTable,
        _options: &RenderOptions,
    ) -> Result<Vec<u8>> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        // Register image XObjects up front, one per distinct resolvable
        // reference, in document order.
        let mut xobjects = lopdf::Dictionary::new();
        let mut image_names: std::collections::BTreeMap<String, (String, f32, f32)> =
            std::collections::BTreeMap::new();
        for section in &package.document.sections {
            for block in &section.blocks {
                let Block::Image {
                    resolved: Some(key),
                    ..
                } = block
                else {
                    continue;
                };
                if image_names.contains_key(key) || !images.contains_key(key) {
                    continue;
                }
                let Some(resource) = package.resources.get(key) else {
                    continue;
                };
                match prepare_jpeg(&resource.data, &resource.media_type) {
                    Some((jpeg, width, height)) => {
                        let name = format!("Im{}", image_names.len());
                        let stream_id = doc.add_object(Stream::new(
                            dictionary! {
                                "Type" => "XObject",
                                "Subtype" => "Image",
                                "Width" => width as i64,
                                "Height" => height as i64,
                                "ColorSpace" => "DeviceRGB",
                                "BitsPerComponent" => 8,
                                "Filter" => "DCTDecode",
                            },
                            jpeg,
                        ));
                        xobjects.set(name.as_bytes().to_vec(), stream_id);
                        image_names.insert(key.clone(), (name, width as f32, height as f32));
                    }
                    None => {
                        warn!(key = %key, "skipping undecodable image");
                    }
                }
            }
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
            "XObject" => Object::Dictionary(xobjects),
        });

        // Lay the blocks out, spine order, paginating as we go
        let mut layout = Layout::new();
        for section in &package.document.sections {
            for block in &section.blocks {
                match block {
                    Block::Heading { level, spans } => {
                        let size = heading_size(*level);
                        layout.space(HEADING_GAP);
                        layout.text(&block_text(spans), "F2", size, size + 4.0);
                        layout.space(HEADING_GAP / 2.0);
                    }
                    Block::Paragraph { spans } => {
                        layout.text(&block_text(spans), "F1", BODY_SIZE, BODY_LEADING);
                        layout.space(PARAGRAPH_GAP);
                    }
                    Block::Image { resolved, .. } => {
                        if let Some((name, width, height)) =
                            resolved.as_ref().and_then(|key| image_names.get(key))
                        {
                            layout.image(name, *width, *height);
                        }
                    }
                }
            }
        }
        let pages = layout.finish();

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| Error::Render(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(out)
    }
}

/// Accumulates page content streams, breaking pages when the cursor passes
/// the bottom margin.
struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        let ops = std::mem::take(&mut self.current);
        self.pages.push(ops);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN && !self.current.is_empty() {
            self.break_page();
        }
    }

    fn space(&mut self, amount: f32) {
        if !self.current.is_empty() {
            self.y -= amount;
        }
    }

    fn text(&mut self, text: &str, font: &str, size: f32, leading: f32) {
        let max_chars = (CONTENT_WIDTH / (size * AVG_GLYPH_WIDTH)).max(1.0) as usize;
        for line in wrap_text(text, max_chars) {
            self.ensure_room(leading);
            self.y -= leading;
            self.current.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font.into(), size.into()]),
                Operation::new("Td", vec![MARGIN.into(), self.y.into()]),
                Operation::new("Tj", vec![Object::string_literal(encode_winansi(&line))]),
                Operation::new("ET", vec![]),
            ]);
        }
    }

    fn image(&mut self, name: &str, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let mut scale = (CONTENT_WIDTH / width).min(1.0);
        // Never taller than a full page of content
        let max_height = PAGE_HEIGHT - 2.0 * MARGIN;
        if height * scale > max_height {
            scale = max_height / height;
        }
        let (w, h) = (width * scale, height * scale);

        self.ensure_room(h);
        self.y -= h;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    w.into(),
                    0.into(),
                    0.into(),
                    h.into(),
                    MARGIN.into(),
                    self.y.into(),
                ],
            ),
            Operation::new("Do", vec![name.into()]),
            Operation::new("Q", vec![]),
        ]);
        self.y -= IMAGE_GAP;
    }

    /// Always yields at least one page, so a zero-section document still
    /// produces a valid (empty-bodied) PDF.
    fn finish(mut self) -> Vec<Vec<Operation>> {
        let ops = std::mem::take(&mut self.current);
        self.pages.push(ops);
        self.pages
    }
}

/// Greedy word wrap on an estimated character budget.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Map text to WinAnsiEncoding bytes; characters outside the code page
/// become '?'.
///
/// The 0x80-0x9F range carries the CP1252 punctuation (curly quotes,
/// dashes, ellipsis) that the container decode path itself produces, so
/// those map to their code-page bytes rather than degrading.
fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85, // ellipsis
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99, // trademark
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => {
                let code = c as u32;
                if code < 256 { code as u8 } else { b'?' }
            }
        })
        .collect()
}

/// Produce DCTDecode-ready bytes plus pixel dimensions. JPEG passes
/// through; other raster formats are re-encoded.
fn prepare_jpeg(data: &[u8], media_type: &str) -> Option<(Vec<u8>, u32, u32)> {
    if media_type == "image/jpeg" {
        let (width, height) = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()?;
        return Some((data.to_vec(), width, height));
    }

    let decoded = image::load_from_memory(data).ok()?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 85);
    image::DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .ok()?;
    Some((jpeg, width, height))
}
