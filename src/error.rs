//! Error types for bookflat operations.

use thiserror::Error;

/// Errors that can occur while reading, converting, or rendering an ebook.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container archive, its index, or its manifest is malformed.
    #[error("invalid container: {0}")]
    Container(String),

    /// The input or output kind is not recognized, or a required capability
    /// for it is not available.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The external conversion tool is not resolvable on the system path.
    #[error("external converter not found: {0}")]
    ToolMissing(String),

    /// The external conversion tool ran but failed; carries its diagnostics.
    #[error("external converter failed: {0}")]
    ToolFailure(String),

    /// A format-specific layout failure (PDF page construction, etc.).
    #[error("render error: {0}")]
    Render(String),
}

impl Error {
    /// Stable label for batch reports and log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Container(_) => "container",
            Error::UnsupportedFormat(_) => "unsupported-format",
            Error::ToolMissing(_) => "tool-missing",
            Error::ToolFailure(_) => "tool-failure",
            Error::Render(_) => "render",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
