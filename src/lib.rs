//! # bookflat
//!
//! Convert ebooks into flat, single-file outputs: plain text, Markdown,
//! self-contained HTML, PDF, and DOCX.
//!
//! EPUB containers are read natively; legacy and modern Kindle formats
//! (MOBI/AZW/AZW3/KFX) are bridged through Calibre's `ebook-convert` when it
//! is installed. Comic archives (CBZ) get placeholder extraction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bookflat::{ConversionRequest, OutputFormat, RenderOptions, convert_file};
//!
//! let request = ConversionRequest::new("input.epub", OutputFormat::Markdown);
//! convert_file(&request, &RenderOptions::default()).unwrap();
//! // -> input_flat.md
//! ```
//!
//! ## Pipeline
//!
//! Every conversion runs the same stages: detect the input kind from the
//! extension, read the container into a [`Package`] (document sections in
//! spine order plus an image/stylesheet resource index), normalize each
//! section's markup into structural blocks, then render with the target
//! format's [`render::Renderer`]. Output files are written atomically.
//!
//! [`convert_batch`] runs many files and aggregates per-file outcomes
//! without letting one failure abort the rest.

pub mod batch;
pub mod comic;
pub mod doc;
pub mod embed;
pub mod epub;
pub mod error;
pub mod external;
pub mod format;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub(crate) mod util;

pub use batch::{BatchResult, BatchStatus, convert_batch};
pub use doc::{Block, Document, Package, Section, Span};
pub use epub::read_epub;
pub use error::{Error, Result};
pub use external::ExternalConverter;
pub use format::{InputKind, OutputFormat};
pub use pipeline::{ConversionRequest, convert_file, output_path_for};
pub use render::{RenderOptions, Renderer};
