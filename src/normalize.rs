//! Content normalizer: raw section markup into structural blocks.
//!
//! Parsing is permissive (html5ever via `scraper`): malformed markup still
//! yields a DOM, and anything that produces no structural blocks degrades to
//! plain text instead of raising. Script and style subtrees are removed
//! before extraction.
//!
//! Spans keep the original spacing found inside tags. Whitespace collapsing
//! happens only when deriving `plain_text`, which feeds the plain-text and
//! Markdown renderers; the HTML and PDF renderers consume the raw spans.

use scraper::{ElementRef, Html, Selector};

use crate::doc::{Block, Package, ResourceIndex, Section, Span, block_text};
use crate::util::{decode_text, resolve_href};

/// Normalize every section of a package, in spine order.
pub fn normalize_package(package: &mut Package) {
    let resources = &package.resources;
    for section in &mut package.document.sections {
        normalize_section(section, resources);
    }
}

/// Fill a section's `blocks` and `plain_text` from its raw markup.
pub fn normalize_section(section: &mut Section, resources: &ResourceIndex) {
    let markup = decode_text(&section.raw_markup);
    let dom = Html::parse_document(&markup);

    let body_selector = Selector::parse("body").unwrap();
    let root = dom
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| dom.root_element());

    let mut collector = Collector {
        blocks: Vec::new(),
        spans: Vec::new(),
        bold: 0,
        italic: 0,
        section_path: &section.path,
        resources,
    };
    walk_children(root, &mut collector);
    collector.flush();

    let blocks = collector.blocks;
    let plain_text = if blocks.is_empty() {
        // Degraded path: no structure recovered, text only.
        collapse_whitespace(&root.text().collect::<String>())
    } else {
        derive_plain_text(&blocks)
    };

    section.blocks = blocks;
    section.plain_text = plain_text;
}

struct Collector<'a> {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    bold: u32,
    italic: u32,
    section_path: &'a str,
    resources: &'a ResourceIndex,
}

impl Collector<'_> {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let kind = if self.bold > 0 {
            SpanKind::Bold
        } else if self.italic > 0 {
            SpanKind::Italic
        } else {
            SpanKind::Text
        };

        // Merge adjacent runs of the same kind
        if let Some(last) = self.spans.last_mut()
            && SpanKind::of(last) == kind
        {
            match last {
                Span::Text(t) | Span::Bold(t) | Span::Italic(t) => t.push_str(text),
            }
            return;
        }

        self.spans.push(match kind {
            SpanKind::Text => Span::Text(text.to_string()),
            SpanKind::Bold => Span::Bold(text.to_string()),
            SpanKind::Italic => Span::Italic(text.to_string()),
        });
    }

    /// End the current paragraph. Span runs that are all whitespace are
    /// dropped rather than becoming empty paragraphs.
    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        if spans.iter().any(|s| !s.text().trim().is_empty()) {
            self.blocks.push(Block::Paragraph { spans });
        }
    }

    fn push_image(&mut self, src: &str) {
        self.flush();
        self.blocks.push(Block::Image {
            src: src.to_string(),
            resolved: self.resolve_image(src),
        });
    }

    /// Resolve an image reference against this section's archive path.
    /// External and data URIs never resolve; a percent-decoded retry covers
    /// encoded hrefs.
    fn resolve_image(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty()
            || src.starts_with("http://")
            || src.starts_with("https://")
            || src.starts_with("data:")
        {
            return None;
        }

        let key = resolve_href(self.section_path, src);
        if self.resources.contains_key(&key) {
            return Some(key);
        }

        let decoded = percent_encoding::percent_decode_str(src)
            .decode_utf8()
            .ok()?;
        let key = resolve_href(self.section_path, &decoded);
        self.resources.contains_key(&key).then_some(key)
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum SpanKind {
    Text,
    Bold,
    Italic,
}

impl SpanKind {
    fn of(span: &Span) -> Self {
        match span {
            Span::Text(_) => SpanKind::Text,
            Span::Bold(_) => SpanKind::Bold,
            Span::Italic(_) => SpanKind::Italic,
        }
    }
}

fn walk_children(el: ElementRef, ctx: &mut Collector) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            walk_element(child_el, ctx);
        } else if let Some(text) = child.value().as_text() {
            ctx.push_text(text);
        }
    }
}

fn walk_element(el: ElementRef, ctx: &mut Collector) {
    match el.value().name() {
        // Non-content subtrees are removed before extraction
        "script" | "style" | "noscript" | "template" | "head" | "title" => {}

        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = el.value().name().as_bytes()[1] - b'0';
            heading(el, level.clamp(1, 6), ctx);
        }

        "img" => {
            if let Some(src) = el.value().attr("src") {
                ctx.push_image(src);
            }
        }

        "br" => ctx.push_text("\n"),

        "b" | "strong" => {
            ctx.bold += 1;
            walk_children(el, ctx);
            ctx.bold -= 1;
        }

        "i" | "em" => {
            ctx.italic += 1;
            walk_children(el, ctx);
            ctx.italic -= 1;
        }

        // Block-level boundaries end the current paragraph on both sides
        "p" | "div" | "section" | "article" | "blockquote" | "li" | "ul" | "ol" | "dl"
        | "dt" | "dd" | "table" | "tr" | "td" | "th" | "pre" | "hr" | "figure"
        | "figcaption" | "header" | "footer" | "aside" | "nav" | "main" => {
            ctx.flush();
            walk_children(el, ctx);
            ctx.flush();
        }

        // Unknown and inline elements contribute their children
        _ => walk_children(el, ctx),
    }
}

fn heading(el: ElementRef, level: u8, ctx: &mut Collector) {
    ctx.flush();

    // Collect the heading's own spans with a fresh accumulator
    let saved = std::mem::take(&mut ctx.spans);
    walk_children(el, ctx);
    let spans = std::mem::replace(&mut ctx.spans, saved);

    if spans.iter().any(|s| !s.text().trim().is_empty()) {
        ctx.blocks.push(Block::Heading { level, spans });
    }
}

/// Join block texts with blank lines and apply the plain-text whitespace
/// policy. Image blocks contribute nothing here.
fn derive_plain_text(blocks: &[Block]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for block in blocks {
        let spans = match block {
            Block::Heading { spans, .. } | Block::Paragraph { spans } => spans,
            Block::Image { .. } => continue,
        };
        let collapsed = collapse_whitespace(&block_text(spans));
        let trimmed = collapsed.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.join("\n\n")
}

/// Collapse runs of horizontal whitespace to one space and runs of blank
/// lines to exactly one blank line. Leading and trailing blank lines drop.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines() {
        let mut collapsed = String::with_capacity(line.len());
        let mut in_space = false;
        for ch in line.chars() {
            if ch.is_whitespace() {
                in_space = !collapsed.is_empty();
            } else {
                if in_space {
                    collapsed.push(' ');
                    in_space = false;
                }
                collapsed.push(ch);
            }
        }

        if collapsed.is_empty() {
            pending_blank = !out.is_empty();
        } else {
            if !out.is_empty() {
                out.push('\n');
                if pending_blank {
                    out.push('\n');
                }
            }
            pending_blank = false;
            out.push_str(&collapsed);
        }
    }

    out
}
