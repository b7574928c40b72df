//! Format renderers: the normalized document into output bytes.
//!
//! Renderers are pure with respect to the document (no mutation) and
//! deterministic: the same input renders to byte-identical output, except
//! for the generation timestamp embedded by the plain-text/Markdown
//! document header, which [`RenderOptions::timestamp`] lets callers pin.
//!
//! Renderers produce a full byte buffer; writing it to disk (atomically) is
//! the pipeline's job, so a render failure never leaves a partial file.

use chrono::{DateTime, Utc};

use crate::doc::Package;
use crate::embed::ImageTable;
use crate::error::{Error, Result};
use crate::format::OutputFormat;

mod docx;
mod html;
mod markdown;
mod pdf;
mod text;

pub use docx::DocxRenderer;
pub use html::HtmlRenderer;
pub use markdown::MarkdownRenderer;
pub use pdf::PdfRenderer;
pub use text::TextRenderer;

/// Configuration threaded explicitly through every render call. Never read
/// from ambient state.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Prefix plain-text/Markdown output with a metadata header block
    /// (title, author, generation timestamp, byte length).
    pub document_header: bool,
    /// Promote long untagged lines to level-2 headings in Markdown, for
    /// inputs that lost their structural tags.
    pub heuristic_headings: bool,
    /// Pin the generation timestamp; `None` means now. Tests pin this to
    /// make header output reproducible.
    pub timestamp: Option<DateTime<Utc>>,
}

impl RenderOptions {
    pub(crate) fn generated_at(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}

/// Capability implemented by every native format renderer.
pub trait Renderer {
    fn render(
        &self,
        package: &Package,
        images: &ImageTable,
        options: &RenderOptions,
    ) -> Result<Vec<u8>>;
}

/// Render a normalized package with the renderer for `format`.
///
/// Dispatch is exhaustive over [`OutputFormat`]; the one non-native kind
/// (legacy Kindle) is handled by the external converter before rendering is
/// ever reached.
pub fn render(
    format: OutputFormat,
    package: &Package,
    images: &ImageTable,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Text => TextRenderer.render(package, images, options),
        OutputFormat::Markdown => MarkdownRenderer.render(package, images, options),
        OutputFormat::Html => HtmlRenderer.render(package, images, options),
        OutputFormat::Pdf => PdfRenderer.render(package, images, options),
        OutputFormat::Docx => DocxRenderer.render(package, images, options),
        OutputFormat::Mobi => Err(Error::UnsupportedFormat(
            "legacy Kindle output is produced by the external converter".into(),
        )),
    }
}
