//! Container reader: EPUB (and iBooks) packages into the document model.

mod parser;
mod reader;

pub use parser::{EntryClass, ManifestEntry, OpfData, parse_container_xml, parse_opf};
pub use reader::{read_epub, read_epub_from_reader};
