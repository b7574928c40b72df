//! Bridge to Calibre's `ebook-convert` for the formats without a native
//! reader or writer (legacy and modern Kindle containers).
//!
//! The converter is invoked with a direct argument vector, never through a
//! shell, and is bounded by a wall-clock timeout so one wedged conversion
//! can't stall a batch.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const DEFAULT_PROGRAM: &str = "ebook-convert";

/// Default wall-clock bound for one external conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How much stderr to keep for error messages.
const STDERR_TAIL: usize = 2048;

pub struct ExternalConverter {
    program: PathBuf,
    timeout: Duration,
}

impl ExternalConverter {
    /// Probe for `ebook-convert` on the PATH.
    ///
    /// Runs `--version` once; a launch failure or non-zero exit means the
    /// tool is absent or broken, reported with an install hint.
    pub fn locate() -> Result<Self> {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Probe a specific converter binary instead of the PATH default.
    pub fn with_program(program: impl Into<PathBuf>) -> Result<Self> {
        let program = program.into();
        let output = Command::new(&program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();
        match output {
            Ok(out) if out.status.success() => {
                debug!(program = %program.display(), "external converter available");
                Ok(Self {
                    program,
                    timeout: DEFAULT_TIMEOUT,
                })
            }
            Ok(out) => Err(Error::ToolMissing(format!(
                "{} exited with {} during version probe; install Calibre to convert Kindle formats",
                program.display(),
                out.status
            ))),
            Err(e) => Err(Error::ToolMissing(format!(
                "{} not found ({e}); install Calibre to convert Kindle formats",
                program.display()
            ))),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert `input` to `output`, inferring formats from the extensions
    /// the way `ebook-convert` does.
    ///
    /// On failure or timeout any partially written output file is removed.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        debug!(
            input = %input.display(),
            output = %output.display(),
            "delegating to external converter"
        );
        let result = self.run(input, output);
        if result.is_err() && output.exists() {
            if let Err(e) = std::fs::remove_file(output) {
                warn!(path = %output.display(), error = %e, "failed to remove partial output");
            }
        }
        result
    }

    /// Convert a Kindle container to a throwaway EPUB for the native
    /// pipeline to read. The returned [`TempDir`] owns the file's lifetime.
    pub fn bridge_to_epub(&self, input: &Path) -> Result<(TempDir, PathBuf)> {
        let dir = TempDir::new()?;
        let bridged = dir.path().join("bridged.epub");
        self.convert(input, &bridged)?;
        Ok((dir, bridged))
    }

    fn run(&self, input: &Path, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.program)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ToolMissing(format!(
                        "{} not found; install Calibre to convert Kindle formats",
                        self.program.display()
                    ))
                } else {
                    Error::Io(e)
                }
            })?;

        // Drain stderr on a helper thread so the child can't block on a
        // full pipe while we poll for exit.
        let stderr = child.stderr.take();
        let drain = std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });

        let status = self.wait_with_timeout(&mut child, input)?;
        let stderr = drain.join().unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailure(format!(
                "{} failed with {} converting {}: {}",
                self.program.display(),
                status,
                input.display(),
                stderr_tail(&stderr)
            )))
        }
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        input: &Path,
    ) -> Result<std::process::ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!(error = %e, "failed to kill timed-out converter");
                }
                let _ = child.wait();
                return Err(Error::ToolFailure(format!(
                    "external converter timed out after {}s converting {}",
                    self.timeout.as_secs(),
                    input.display()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        return "(no stderr)".into();
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > STDERR_TAIL {
        chars[chars.len() - STDERR_TAIL..].iter().collect()
    } else {
        text.to_string()
    }
}
