//! Office Open XML renderer.
//!
//! Emits the minimal WordprocessingML package a word processor needs:
//! content types, package relationships, a styles part defining Normal and
//! Heading 1-6, and the document body itself. Headings map to the built-in
//! heading styles; bold and italic spans carry run properties. Images are
//! dropped by policy.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::doc::{Block, Package, Span};
use crate::embed::ImageTable;
use crate::error::{Error, Result};

use super::{RenderOptions, Renderer};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

/// Heading sizes in half-points, level 1 through 6.
const HEADING_HALF_POINTS: [u32; 6] = [40, 34, 30, 26, 24, 22];

pub struct DocxRenderer;

impl Renderer for DocxRenderer {
    fn render(
        &self,
        package: &Package,
        _images: &ImageTable,
        _options: &RenderOptions,
    ) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        write_part(&mut writer, "[Content_Types].xml", CONTENT_TYPES, options)?;
        write_part(&mut writer, "_rels/.rels", PACKAGE_RELS, options)?;
        write_part(&mut writer, "word/_rels/document.xml.rels", DOCUMENT_RELS, options)?;
        write_part(&mut writer, "word/styles.xml", &styles_xml(), options)?;
        write_part(&mut writer, "word/document.xml", &document_xml(package), options)?;

        let cursor = writer
            .finish()
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

fn write_part(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    writer
        .start_file(name, options)
        .map_err(|e| Error::Render(e.to_string()))?;
    writer.write_all(content.as_bytes())?;
    Ok(())
}

fn styles_xml() -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:styleId="Normal" w:default="1">
<w:name w:val="Normal"/>
<w:rPr><w:sz w:val="22"/></w:rPr>
</w:style>
"#,
    );
    for (i, half_points) in HEADING_HALF_POINTS.iter().enumerate() {
        let level = i + 1;
        let _ = write!(
            out,
            r#"<w:style w:type="paragraph" w:styleId="Heading{level}">
<w:name w:val="heading {level}"/>
<w:basedOn w:val="Normal"/>
<w:pPr><w:spacing w:before="240" w:after="120"/></w:pPr>
<w:rPr><w:b/><w:sz w:val="{half_points}"/></w:rPr>
</w:style>
"#,
        );
    }
    out.push_str("</w:styles>");
    out
}

fn document_xml(package: &Package) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
"#,
    );

    for section in &package.document.sections {
        for block in &section.blocks {
            match block {
                Block::Heading { level, spans } => {
                    let level = (*level).clamp(1, 6);
                    let _ = write!(
                        out,
                        "<w:p><w:pPr><w:pStyle w:val=\"Heading{level}\"/></w:pPr>"
                    );
                    write_runs(&mut out, spans);
                    out.push_str("</w:p>\n");
                }
                Block::Paragraph { spans } => {
                    out.push_str("<w:p>");
                    write_runs(&mut out, spans);
                    out.push_str("</w:p>\n");
                }
                Block::Image { .. } => {}
            }
        }
    }

    // Single section with US-Letter geometry, 1in margins (twips)
    out.push_str(
        r#"<w:sectPr>
<w:pgSz w:w="12240" w:h="15840"/>
<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440"/>
</w:sectPr>
</w:body>
</w:document>"#,
    );
    out
}

fn write_runs(out: &mut String, spans: &[Span]) {
    for span in spans {
        let (props, text) = match span {
            Span::Text(t) => ("", t),
            Span::Bold(t) => ("<w:rPr><w:b/></w:rPr>", t),
            Span::Italic(t) => ("<w:rPr><w:i/></w:rPr>", t),
        };
        if text.is_empty() {
            continue;
        }
        let _ = write!(
            out,
            "<w:r>{props}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape_xml(text)
        );
    }
}

fn escape_xml(text: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Section;
    use std::io::Read;
    use zip::ZipArchive;

    fn package_with_blocks(blocks: Vec<Block>) -> Package {
        let mut section = Section::new("s0", 0, "ch0.xhtml", "application/xhtml+xml", Vec::new());
        section.blocks = blocks;
        let mut package = Package::default();
        package.document.sections.push(section);
        package
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_package_parts_present() {
        let package = package_with_blocks(vec![]);
        let out = DocxRenderer
            .render(&package, &ImageTable::new(), &RenderOptions::default())
            .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(out)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/document.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {name}");
        }
    }

    #[test]
    fn test_heading_and_runs() {
        let package = package_with_blocks(vec![
            Block::Heading {
                level: 2,
                spans: vec![Span::Text("Chapter".into())],
            },
            Block::Paragraph {
                spans: vec![Span::Text("plain ".into()), Span::Bold("bold".into())],
            },
        ]);
        let out = DocxRenderer
            .render(&package, &ImageTable::new(), &RenderOptions::default())
            .unwrap();
        let document = read_part(&out, "word/document.xml");

        assert!(document.contains("<w:pStyle w:val=\"Heading2\"/>"));
        assert!(document.contains("<w:t xml:space=\"preserve\">plain </w:t>"));
        assert!(document.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">bold</w:t>"));
        assert!(document.contains("<w:sectPr>"));
    }

    #[test]
    fn test_text_escaped() {
        let package = package_with_blocks(vec![Block::Paragraph {
            spans: vec![Span::Text("a < b & c".into())],
        }]);
        let out = DocxRenderer
            .render(&package, &ImageTable::new(), &RenderOptions::default())
            .unwrap();
        let document = read_part(&out, "word/document.xml");
        assert!(document.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_styles_define_six_heading_levels() {
        let styles = styles_xml();
        for level in 1..=6 {
            assert!(styles.contains(&format!("w:styleId=\"Heading{level}\"")));
        }
    }
}
