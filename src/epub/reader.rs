use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::doc::{Document, Package, Resource, Section};
use crate::epub::parser::{EntryClass, parse_container_xml, parse_opf};
use crate::error::{Error, Result};
use crate::util::{decode_text, join_path, strip_bom};

/// Read an EPUB (or iBooks) container from disk into a [`Package`].
///
/// The archive handle is scoped to this call and released on every exit
/// path, including parse failures.
pub fn read_epub<P: AsRef<Path>>(path: P) -> Result<Package> {
    let file = std::fs::File::open(path)?;
    read_epub_from_reader(file)
}

/// Read an EPUB from any [`Read`] + [`Seek`] source.
pub fn read_epub_from_reader<R: Read + Seek>(reader: R) -> Result<Package> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| Error::Container(format!("not a ZIP archive: {e}")))?;

    // 1. Find the OPF path from container.xml
    let container = read_archive_file_bytes(&mut archive, "META-INF/container.xml")
        .map_err(|e| Error::Container(format!("missing META-INF/container.xml: {e}")))?;
    let opf_path = parse_container_xml(&container)?;
    let opf_dir = match opf_path.rfind('/') {
        Some(pos) => opf_path[..pos].to_string(),
        None => String::new(),
    };

    // 2. Parse the OPF package document
    let opf_bytes = read_archive_file_bytes(&mut archive, &opf_path)
        .map_err(|e| Error::Container(format!("missing OPF {opf_path}: {e}")))?;
    let opf = parse_opf(&decode_text(strip_bom(&opf_bytes)))?;

    debug!(
        manifest = opf.manifest.len(),
        spine = opf.spine.len(),
        "parsed package document"
    );

    // 3. Image and style resources, keyed by normalized archive path.
    //    Stylesheet text concatenates in manifest encounter order.
    let mut package = Package {
        document: Document {
            title: opf.title.clone(),
            author: opf.author.clone(),
            sections: Vec::new(),
        },
        ..Default::default()
    };

    for entry in &opf.manifest {
        let class = entry.class();
        if !matches!(class, EntryClass::Image | EntryClass::Style) {
            continue;
        }
        let key = join_path(&opf_dir, &entry.href);
        let data = match read_archive_file_bytes(&mut archive, &key) {
            Ok(data) => data,
            Err(e) => {
                // Manifest entries sometimes point at files the archive
                // doesn't carry; content loss, not a hard failure.
                warn!(href = %entry.href, "manifest resource missing from archive: {e}");
                continue;
            }
        };
        if class == EntryClass::Style {
            package.stylesheet.push_str(&decode_text(&data));
            package.stylesheet.push('\n');
        }
        package.resources.insert(
            key,
            Resource {
                media_type: entry.media_type.clone(),
                data,
            },
        );
    }

    // 4. One Section per spine entry, in spine order. Every idref must
    //    resolve to a manifest entry with a payload in the archive.
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (order, idref) in opf.spine.iter().enumerate() {
        let entry = opf.manifest_entry(idref).ok_or_else(|| {
            Error::Container(format!("spine idref '{idref}' not found in manifest"))
        })?;
        if !seen_ids.insert(idref.as_str()) {
            return Err(Error::Container(format!("duplicate spine idref '{idref}'")));
        }

        let path = join_path(&opf_dir, &entry.href);
        let raw = read_archive_file_bytes(&mut archive, &path).map_err(|e| {
            Error::Container(format!("spine item '{}' unreadable: {e}", entry.href))
        })?;

        package.document.sections.push(Section::new(
            idref.clone(),
            order,
            path,
            entry.media_type.clone(),
            raw,
        ));
    }

    Ok(package)
}

/// Read one archive entry, falling back to the percent-decoded path for
/// malformed containers that store encoded hrefs.
fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(Error::Container(e.to_string())),
    }

    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::Container(format!("invalid UTF-8 in path: {path}")))?;

    let mut file = archive
        .by_name(&decoded)
        .map_err(|e| Error::Container(format!("{path}: {e}")))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}
