//! In-memory document model extracted from a container.
//!
//! A [`Document`] is built once per conversion, normalized once, and then
//! shared read-only by the renderers. Nothing here is mutated after
//! normalization.

use std::collections::BTreeMap;

/// A reading-ordered document extracted from a container.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Sections in spine order. Order is strictly increasing and renderers
    /// must never reorder them.
    pub sections: Vec<Section>,
}

/// One spine entry's content.
#[derive(Debug, Clone)]
pub struct Section {
    /// Manifest id; unique within a document.
    pub id: String,
    /// Spine position, starting at 0.
    pub order: usize,
    /// Normalized archive path of the content document. Relative hrefs in
    /// the markup resolve against this path's directory.
    pub path: String,
    pub media_type: String,
    /// Raw bytes of the referenced manifest entry.
    pub raw_markup: Vec<u8>,
    /// Structural blocks extracted by the normalizer.
    pub blocks: Vec<Block>,
    /// Whitespace-collapsed text derived by the normalizer. Used by the
    /// plain-text and Markdown paths only.
    pub plain_text: String,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        order: usize,
        path: impl Into<String>,
        media_type: impl Into<String>,
        raw_markup: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            order,
            path: path.into(),
            media_type: media_type.into(),
            raw_markup,
            blocks: Vec::new(),
            plain_text: String::new(),
        }
    }
}

/// A cleaned structural element of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        /// 1 through 6.
        level: u8,
        spans: Vec<Span>,
    },
    Paragraph {
        spans: Vec<Span>,
    },
    /// An image reference found in the markup. `src` is the original
    /// reference string, kept verbatim; `resolved` is the ResourceIndex key
    /// when the reference resolves relative to the section's path.
    Image {
        src: String,
        resolved: Option<String>,
    },
}

/// An inline text run. Spans preserve the original spacing inside tags;
/// whitespace collapsing happens only on the plain-text/Markdown paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(String),
    Italic(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Text(t) | Span::Bold(t) | Span::Italic(t) => t,
        }
    }
}

/// A non-content asset declared by the manifest (image, style sheet).
#[derive(Debug, Clone)]
pub struct Resource {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Resources keyed by normalized archive path. Lookups mirror relative-href
/// resolution, so keys are paths, never manifest ids. Built once, read-only
/// after construction.
pub type ResourceIndex = BTreeMap<String, Resource>;

/// Everything the container reader produces for one input file.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub document: Document,
    pub resources: ResourceIndex,
    /// All `text/css` resources concatenated in manifest encounter order.
    /// No cascade resolution is performed.
    pub stylesheet: String,
}

/// Concatenated text of all spans in a block, original spacing intact.
pub fn block_text(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        out.push_str(span.text());
    }
    out
}
