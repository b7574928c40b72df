//! Shared fixture builders for the integration tests.
//!
//! Fixtures are synthesized on the fly with the same zip stack the readers
//! use, so the tests carry no binary test data.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A content document or resource destined for the EPUB manifest.
pub struct EpubEntry {
    pub href: &'static str,
    pub media_type: &'static str,
    pub data: Vec<u8>,
    pub in_spine: bool,
}

impl EpubEntry {
    pub fn chapter(href: &'static str, markup: &str) -> Self {
        Self {
            href,
            media_type: "application/xhtml+xml",
            data: markup.as_bytes().to_vec(),
            in_spine: true,
        }
    }

    pub fn image(href: &'static str, media_type: &'static str, data: Vec<u8>) -> Self {
        Self {
            href,
            media_type,
            data,
            in_spine: false,
        }
    }

    pub fn stylesheet(href: &'static str, css: &str) -> Self {
        Self {
            href,
            media_type: "text/css",
            data: css.as_bytes().to_vec(),
            in_spine: false,
        }
    }
}

/// Build a minimal but well-formed EPUB in memory.
pub fn epub_bytes(title: &str, author: Option<&str>, entries: &[EpubEntry]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default();

    writer.start_file("mimetype", stored).unwrap();
    writer.write_all(b"application/epub+zip").unwrap();

    writer.start_file("META-INF/container.xml", deflated).unwrap();
    writer
        .write_all(
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        )
        .unwrap();

    let mut manifest = String::new();
    let mut spine = String::new();
    for (i, entry) in entries.iter().enumerate() {
        manifest.push_str(&format!(
            "    <item id=\"item{i}\" href=\"{}\" media-type=\"{}\"/>\n",
            entry.href, entry.media_type
        ));
        if entry.in_spine {
            spine.push_str(&format!("    <itemref idref=\"item{i}\"/>\n"));
        }
    }

    let author_xml = author
        .map(|a| format!("    <dc:creator>{a}</dc:creator>\n"))
        .unwrap_or_default();
    let opf = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:test</dc:identifier>
    <dc:title>{title}</dc:title>
{author_xml}  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine>
{spine}  </spine>
</package>"#
    );
    writer.start_file("OEBPS/content.opf", deflated).unwrap();
    writer.write_all(opf.as_bytes()).unwrap();

    for entry in entries {
        writer
            .start_file(format!("OEBPS/{}", entry.href), deflated)
            .unwrap();
        writer.write_all(&entry.data).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Build a CBZ in memory from (entry name, payload) pairs.
pub fn cbz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A real 1x1 JPEG, encoded through the image crate.
pub fn tiny_jpeg() -> Vec<u8> {
    let mut out = Vec::new();
    let rgb = image::RgbImage::from_pixel(1, 1, image::Rgb([200, 100, 50]));
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90);
    image::DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .unwrap();
    out
}

pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Two-chapter EPUB with a heading, emphasis, a referenced JPEG, and a
/// stylesheet. The shape most end-to-end tests want.
pub fn sample_epub(dir: &Path, name: &str) -> PathBuf {
    let entries = vec![
        EpubEntry::chapter(
            "ch1.xhtml",
            r#"<html><head><title>One</title></head><body>
<h1>Chapter One</h1>
<p>It was a <b>dark</b> and <i>stormy</i> night.</p>
<p><img src="images/pic.jpg" alt="pic"/></p>
</body></html>"#,
        ),
        EpubEntry::chapter(
            "ch2.xhtml",
            r#"<html><body>
<h2>Chapter Two</h2>
<p>The rain fell in torrents.</p>
</body></html>"#,
        ),
        EpubEntry::image("images/pic.jpg", "image/jpeg", tiny_jpeg()),
        EpubEntry::stylesheet("style.css", "p { margin: 0; }\n"),
    ];
    let bytes = epub_bytes("Stormy Nights", Some("E. Bulwer-Lytton"), &entries);
    write_fixture(dir, name, &bytes)
}
