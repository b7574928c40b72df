//! Comic archive input (CBZ/CBR) with placeholder-only extraction.
//!
//! Page images are not OCRed: each image entry becomes one placeholder
//! section carrying a page label and a content-loss note. This is policy,
//! not a defect.

use std::io::Read;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::doc::{Document, Package, Section};
use crate::error::{Error, Result};
use crate::format::InputKind;

const PLACEHOLDER_NOTE: &str = "[Image content cannot be converted to text]";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Read a comic archive into a placeholder [`Package`].
///
/// CBR needs a RAR decompression capability this crate does not link, so it
/// fails with [`Error::UnsupportedFormat`].
pub fn read_comic(path: &Path, kind: InputKind) -> Result<Package> {
    match kind {
        InputKind::Cbz => read_cbz(path),
        InputKind::Cbr => Err(Error::UnsupportedFormat(
            "CBR requires RAR archive support, which is not available; \
             repackage as CBZ to convert"
                .into(),
        )),
        other => Err(Error::UnsupportedFormat(format!(
            "not a comic archive kind: {other:?}"
        ))),
    }
}

fn read_cbz(path: &Path) -> Result<Package> {
    let file = std::fs::File::open(path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| Error::Container(format!("not a ZIP archive: {e}")))?;

    // Page order is the name-sorted order of image entries.
    let mut pages: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| Error::Container(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if is_image_entry(&name) {
            pages.push(name);
        }
    }
    pages.sort();

    debug!(pages = pages.len(), "enumerated comic archive");

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string);

    let mut document = Document {
        title,
        author: None,
        sections: Vec::new(),
    };

    for (order, name) in pages.iter().enumerate() {
        let markup = format!(
            "<html><body><p>Page {}: {}</p><p>{}</p></body></html>",
            order + 1,
            name,
            PLACEHOLDER_NOTE
        );
        document.sections.push(Section::new(
            format!("page-{}", order + 1),
            order,
            name.clone(),
            "text/html",
            markup.into_bytes(),
        ));
    }

    Ok(Package {
        document,
        ..Default::default()
    })
}

fn is_image_entry(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
