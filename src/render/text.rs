//! Plain-text renderer.

use std::fmt::Write;

use crate::doc::Package;
use crate::embed::ImageTable;
use crate::error::Result;

use super::{RenderOptions, Renderer};

/// Concatenates each section's normalized plain text in spine order,
/// separated by one blank line. The "document" variant prefixes a metadata
/// header block.
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(
        &self,
        package: &Package,
        _images: &ImageTable,
        options: &RenderOptions,
    ) -> Result<Vec<u8>> {
        let body = body_text(package);

        if !options.document_header {
            return Ok(body.into_bytes());
        }

        let mut out = String::with_capacity(body.len() + 256);
        let title = package.document.title.as_deref().unwrap_or("Untitled");
        let _ = writeln!(out, "Title: {title}");
        if let Some(author) = &package.document.author {
            let _ = writeln!(out, "Author: {author}");
        }
        let _ = writeln!(
            out,
            "Generated: {}",
            options.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "Length: {} bytes", body.len());
        out.push_str("\n----\n\n");
        out.push_str(&body);

        Ok(out.into_bytes())
    }
}

/// Section texts joined by one blank line; empty sections contribute
/// nothing. A document with zero sections yields an empty body.
fn body_text(package: &Package) -> String {
    let parts: Vec<&str> = package
        .document
        .sections
        .iter()
        .map(|s| s.plain_text.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{Document, Section};
    use chrono::TimeZone;

    fn package_with_texts(texts: &[&str]) -> Package {
        let mut package = Package::default();
        for (i, text) in texts.iter().enumerate() {
            let mut section = Section::new(
                format!("s{i}"),
                i,
                format!("ch{i}.xhtml"),
                "application/xhtml+xml",
                Vec::new(),
            );
            section.plain_text = text.to_string();
            package.document.sections.push(section);
        }
        package
    }

    #[test]
    fn test_sections_joined_by_blank_line() {
        let package = package_with_texts(&["First.", "Second."]);
        let out = TextRenderer
            .render(&package, &ImageTable::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "First.\n\nSecond.");
    }

    #[test]
    fn test_empty_sections_skipped() {
        let package = package_with_texts(&["First.", "", "Third."]);
        let out = TextRenderer
            .render(&package, &ImageTable::new(), &RenderOptions::default())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "First.\n\nThird.");
    }

    #[test]
    fn test_zero_sections_render_empty() {
        let package = Package::default();
        let out = TextRenderer
            .render(&package, &ImageTable::new(), &RenderOptions::default())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_document_header() {
        let mut package = package_with_texts(&["Body."]);
        package.document = Document {
            title: Some("Short Works".into()),
            author: Some("Epictetus".into()),
            sections: package.document.sections,
        };

        let options = RenderOptions {
            document_header: true,
            timestamp: Some(chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..Default::default()
        };
        let out = TextRenderer
            .render(&package, &ImageTable::new(), &options)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("Title: Short Works\n"));
        assert!(out.contains("Author: Epictetus\n"));
        assert!(out.contains("Generated: 2024-01-02 03:04:05 UTC\n"));
        assert!(out.contains("Length: 5 bytes\n"));
        assert!(out.ends_with("----\n\nBody."));
    }
}
