//! Input and output format kinds.
//!
//! Both axes are closed enums: an unknown extension is a runtime error at
//! the boundary, but dispatch over recognized kinds is exhaustive and
//! checked at compile time.

use std::path::Path;

use crate::error::{Error, Result};

/// Recognized input kinds, detected from the file extension
/// (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Native EPUB container.
    Epub,
    /// Apple iBooks Author packages; structurally EPUB, read natively.
    Ibooks,
    /// Legacy Kindle; bridged to EPUB through the external converter.
    Mobi,
    Azw,
    Azw3,
    /// Kindle Format X; bridged through the external converter.
    Kfx,
    /// Comic archive (ZIP); placeholder extraction only.
    Cbz,
    /// Comic archive (RAR); requires a RAR capability we do not link.
    Cbr,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "epub" => Ok(InputKind::Epub),
            "ibooks" | "iba" => Ok(InputKind::Ibooks),
            "mobi" => Ok(InputKind::Mobi),
            "azw" => Ok(InputKind::Azw),
            "azw3" => Ok(InputKind::Azw3),
            "kfx" => Ok(InputKind::Kfx),
            "cbz" => Ok(InputKind::Cbz),
            "cbr" => Ok(InputKind::Cbr),
            _ => Err(Error::UnsupportedFormat(format!(
                "unrecognized input extension: {}",
                path.display()
            ))),
        }
    }

    /// Whether this kind must be bridged to EPUB by the external converter
    /// before the container reader can parse it.
    pub fn needs_bridge(self) -> bool {
        matches!(
            self,
            InputKind::Mobi | InputKind::Azw | InputKind::Azw3 | InputKind::Kfx
        )
    }
}

/// Recognized output kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Page-description output (print-ready).
    Pdf,
    /// Plain text.
    Text,
    /// Structured Markdown.
    Markdown,
    /// Self-contained hypertext with inlined images.
    Html,
    /// Word-processor document (text-only).
    Docx,
    /// Legacy Kindle output; produced by the external converter only.
    Mobi,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Text => "txt",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Docx => "docx",
            OutputFormat::Mobi => "mobi",
        }
    }

    /// Whether this format is produced by a native renderer (as opposed to
    /// the external converter).
    pub fn is_native(self) -> bool {
        !matches!(self, OutputFormat::Mobi)
    }
}
