//! Hypertext renderer: one self-contained document with inlined images.

use std::fmt::Write;

use crate::doc::{Block, Package, Span};
use crate::embed::ImageTable;
use crate::error::Result;

use super::{RenderOptions, Renderer};

/// Wraps the merged stylesheet in a `<style>` block and emits each
/// section's structural blocks as heading/paragraph markup. Image
/// references that resolve in the image table become inline data
/// references; the rest keep their original src string unchanged.
///
/// Inline spacing from the source markup is preserved: this path never
/// collapses whitespace.
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(
        &self,
        package: &Package,
        images: &ImageTable,
        _options: &RenderOptions,
    ) -> Result<Vec<u8>> {
        let title = package.document.title.as_deref().unwrap_or("Untitled");

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n");
        let _ = writeln!(out, "<title>{}</title>", escape_text(title));
        if !package.stylesheet.is_empty() {
            let _ = writeln!(out, "<style>\n{}</style>", package.stylesheet);
        }
        out.push_str("</head>\n<body>\n");

        for section in &package.document.sections {
            for block in &section.blocks {
                match block {
                    Block::Heading { level, spans } => {
                        let _ = write!(out, "<h{level}>");
                        write_spans(&mut out, spans);
                        let _ = writeln!(out, "</h{level}>");
                    }
                    Block::Paragraph { spans } => {
                        out.push_str("<p>");
                        write_spans(&mut out, spans);
                        out.push_str("</p>\n");
                    }
                    Block::Image { src, resolved } => {
                        let inline = resolved.as_ref().and_then(|key| images.get(key));
                        match inline {
                            Some(image) => {
                                let _ = writeln!(
                                    out,
                                    "<p><img src=\"{}\" alt=\"\"/></p>",
                                    image.data_uri
                                );
                            }
                            // Unresolvable references pass through verbatim
                            None => {
                                let _ = writeln!(
                                    out,
                                    "<p><img src=\"{}\" alt=\"\"/></p>",
                                    escape_attr(src)
                                );
                            }
                        }
                    }
                }
            }
        }

        out.push_str("</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

fn write_spans(out: &mut String, spans: &[Span]) {
    for span in spans {
        match span {
            Span::Text(t) => out.push_str(&escape_text(t)),
            Span::Bold(t) => {
                out.push_str("<strong>");
                out.push_str(&escape_text(t));
                out.push_str("</strong>");
            }
            Span::Italic(t) => {
                out.push_str("<em>");
                out.push_str(&escape_text(t));
                out.push_str("</em>");
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
