//! Image embedder: binary image resources as inline data references.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::doc::ResourceIndex;

/// A self-describing inline encoding of one image resource.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub media_type: String,
    /// `data:<media-type>;base64,<payload>`
    pub data_uri: String,
}

/// Inline data references keyed by normalized resource path.
pub type ImageTable = BTreeMap<String, InlineImage>;

/// Build the inline-image table for a document.
///
/// Pure function of the resource index; computed once per document and
/// shared read-only by the renderers that embed images (HTML, PDF). The
/// text-only renderers ignore it.
pub fn build_image_table(resources: &ResourceIndex) -> ImageTable {
    let mut table = ImageTable::new();
    for (path, resource) in resources {
        if !resource.media_type.starts_with("image/") {
            continue;
        }
        let payload = STANDARD.encode(&resource.data);
        table.insert(
            path.clone(),
            InlineImage {
                media_type: resource.media_type.clone(),
                data_uri: format!("data:{};base64,{}", resource.media_type, payload),
            },
        );
    }
    table
}
