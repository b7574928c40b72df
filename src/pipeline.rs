//! Single-file conversion pipeline: detect, read, normalize, render, write.
//!
//! Output is written atomically: the rendered bytes go to a temporary file
//! in the destination directory, then rename into place. A failure at any
//! stage leaves no partial output behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::comic::read_comic;
use crate::doc::Package;
use crate::embed::build_image_table;
use crate::epub::read_epub;
use crate::error::{Error, Result};
use crate::external::ExternalConverter;
use crate::format::{InputKind, OutputFormat};
use crate::normalize::normalize_package;
use crate::render::{self, RenderOptions};

/// One conversion: a source file, a destination path, and a target format.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    /// External converter binary to probe instead of `ebook-convert` on
    /// the PATH. `None` means the PATH default.
    pub converter_program: Option<PathBuf>,
}

impl ConversionRequest {
    /// Request with the default output path: `<stem>_flat.<ext>` next to
    /// the source.
    pub fn new(input: impl Into<PathBuf>, format: OutputFormat) -> Self {
        let input = input.into();
        let output = output_path_for(&input, format);
        Self {
            input,
            output,
            format,
            converter_program: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_converter_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.converter_program = Some(program.into());
        self
    }

    fn converter(&self) -> Result<ExternalConverter> {
        match &self.converter_program {
            Some(program) => ExternalConverter::with_program(program),
            None => ExternalConverter::locate(),
        }
    }
}

/// Default output path beside the source: `book.epub` converted to text
/// becomes `book_flat.txt`.
pub fn output_path_for(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_flat.{}", format.extension()))
}

/// Run one conversion end to end.
pub fn convert_file(request: &ConversionRequest, options: &RenderOptions) -> Result<()> {
    let kind = InputKind::from_path(&request.input)?;
    debug!(
        input = %request.input.display(),
        kind = ?kind,
        format = ?request.format,
        "starting conversion"
    );

    // Legacy Kindle output has no native renderer; the external converter
    // owns the whole conversion.
    if !request.format.is_native() {
        let converter = request.converter()?;
        converter.convert(&request.input, &request.output)?;
        info!(output = %request.output.display(), "conversion complete");
        return Ok(());
    }

    let mut package = load_package(request, kind)?;
    normalize_package(&mut package);
    let images = build_image_table(&package.resources);
    let rendered = render::render(request.format, &package, &images, options)?;

    write_atomic(&request.output, &rendered)?;
    info!(
        output = %request.output.display(),
        bytes = rendered.len(),
        "conversion complete"
    );
    Ok(())
}

/// Read the source container into a [`Package`], bridging Kindle kinds
/// through the external converter first.
fn load_package(request: &ConversionRequest, kind: InputKind) -> Result<Package> {
    match kind {
        InputKind::Epub | InputKind::Ibooks => read_epub(&request.input),
        InputKind::Cbz | InputKind::Cbr => read_comic(&request.input, kind),
        InputKind::Mobi | InputKind::Azw | InputKind::Azw3 | InputKind::Kfx => {
            let converter = request.converter()?;
            // The TempDir must outlive the read.
            let (_dir, bridged) = converter.bridge_to_epub(&request.input)?;
            read_epub(&bridged)
        }
    }
}

/// Write `data` to `path` via a temporary file in the same directory, then
/// rename into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
