//! Container index parsing (container.xml and the OPF package document).

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::util::strip_bom;

/// One manifest `<item>`, in encounter order.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub id: String,
    pub href: String,
    pub media_type: String,
}

impl ManifestEntry {
    /// Classify this entry by media type.
    pub fn class(&self) -> EntryClass {
        let mt = self.media_type.as_str();
        if mt == "application/xhtml+xml" || mt == "text/html" {
            EntryClass::Content
        } else if mt.starts_with("image/") {
            EntryClass::Image
        } else if mt == "text/css" {
            EntryClass::Style
        } else {
            EntryClass::Other
        }
    }
}

/// Manifest entry classification. `Other` entries (fonts, NCX, audio) are
/// ignored by the conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Content,
    Image,
    Style,
    Other,
}

/// Parsed OPF package data.
#[derive(Debug, Clone, Default)]
pub struct OpfData {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Manifest entries in document order. Order matters: the merged
    /// stylesheet concatenates `text/css` entries in encounter order.
    pub manifest: Vec<ManifestEntry>,
    /// Spine idrefs in reading order.
    pub spine: Vec<String>,
}

impl OpfData {
    pub fn manifest_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|e| e.id == id)
    }
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())
        .map_err(|e| Error::Container(format!("container.xml is not UTF-8: {e}")))?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return String::from_utf8(attr.value.to_vec())
                            .map_err(|e| Error::Container(format!("bad rootfile path: {e}")));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Container(format!("container.xml: {e}"))),
            _ => {}
        }
    }

    Err(Error::Container(
        "no rootfile found in container.xml".into(),
    ))
}

/// Parse an OPF package document: metadata, manifest, and spine.
pub fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut data = OpfData::default();

    let mut in_metadata = false;
    let mut current_element: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"metadata" => in_metadata = true,
                    b"title" if in_metadata => {
                        current_element = Some("title");
                        buf_text.clear();
                    }
                    b"creator" if in_metadata => {
                        current_element = Some("creator");
                        buf_text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" => {
                        let mut id = String::new();
                        let mut href = String::new();
                        let mut media_type = String::new();

                        for attr in e.attributes().flatten() {
                            let value = || String::from_utf8_lossy(&attr.value).into_owned();
                            match attr.key.as_ref() {
                                b"id" => id = value(),
                                b"href" => href = value(),
                                b"media-type" => media_type = value(),
                                _ => {}
                            }
                        }

                        if !id.is_empty() {
                            data.manifest.push(ManifestEntry {
                                id,
                                href,
                                media_type,
                            });
                        }
                    }
                    b"itemref" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"idref" {
                                data.spine
                                    .push(String::from_utf8_lossy(&attr.value).into_owned());
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                // Entity references like &apos; inside metadata text
                if current_element.is_some() {
                    buf_text.push_str(resolve_entity(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                }

                if let Some(elem) = current_element.take() {
                    let text = buf_text.trim().to_string();
                    if !text.is_empty() {
                        match elem {
                            "title" if data.title.is_none() => data.title = Some(text),
                            "creator" if data.author.is_none() => data.author = Some(text),
                            _ => {}
                        }
                    }
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Container(format!("OPF: {e}"))),
            _ => {}
        }
    }

    if data.manifest.is_empty() {
        return Err(Error::Container("OPF has an empty manifest".into()));
    }

    Ok(data)
}

fn resolve_entity(entity: &str) -> &'static str {
    match entity {
        "apos" => "'",
        "quot" => "\"",
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        _ => "",
    }
}

/// Extract local name from a potentially namespaced XML name.
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Short Works</dc:title>
    <dc:creator>Epictetus</dc:creator>
  </metadata>
  <manifest>
    <item id="ch1" href="text/ch01.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/ch02.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="styles/main.css" media-type="text/css"/>
    <item id="img" href="images/cover.jpg" media-type="image/jpeg"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

    #[test]
    fn test_parse_opf_metadata_and_spine() {
        let opf = parse_opf(OPF).unwrap();
        assert_eq!(opf.title.as_deref(), Some("Short Works"));
        assert_eq!(opf.author.as_deref(), Some("Epictetus"));
        assert_eq!(opf.spine, vec!["ch1", "ch2"]);
        assert_eq!(opf.manifest.len(), 5);
    }

    #[test]
    fn test_manifest_order_and_classes() {
        let opf = parse_opf(OPF).unwrap();
        let classes: Vec<EntryClass> = opf.manifest.iter().map(|e| e.class()).collect();
        assert_eq!(
            classes,
            vec![
                EntryClass::Content,
                EntryClass::Content,
                EntryClass::Style,
                EntryClass::Image,
                EntryClass::Other,
            ]
        );
    }

    #[test]
    fn test_metadata_entities() {
        let opf = OPF.replace("Short Works", "Don&apos;t Stop");
        let parsed = parse_opf(&opf).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Don't Stop"));
    }

    #[test]
    fn test_empty_manifest_is_error() {
        let opf = r#"<package><manifest></manifest><spine/></package>"#;
        assert!(parse_opf(opf).is_err());
    }

    #[test]
    fn test_parse_container_xml() {
        let xml = br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;
        assert_eq!(parse_container_xml(xml).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_container_xml_without_rootfile() {
        assert!(parse_container_xml(b"<container/>").is_err());
    }
}
