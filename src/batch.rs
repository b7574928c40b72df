//! Batch orchestration: run many conversions, aggregate per-file outcomes.
//!
//! One failing input never aborts the batch; every outcome is recorded and
//! the aggregate is returned as a plain value for the caller to report on.

use std::path::PathBuf;

use tracing::{error, info};

use crate::error::Error;
use crate::format::OutputFormat;
use crate::pipeline::{ConversionRequest, convert_file};
use crate::render::RenderOptions;

/// Aggregate outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub total: usize,
    /// (input, output) pairs that converted.
    pub succeeded: Vec<(PathBuf, PathBuf)>,
    /// (input, error) pairs that did not.
    pub failed: Vec<(PathBuf, Error)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Empty,
    AllSucceeded,
    Partial,
    AllFailed,
}

impl BatchResult {
    pub fn status(&self) -> BatchStatus {
        match (self.succeeded.len(), self.failed.len()) {
            (0, 0) => BatchStatus::Empty,
            (_, 0) => BatchStatus::AllSucceeded,
            (0, _) => BatchStatus::AllFailed,
            _ => BatchStatus::Partial,
        }
    }

    /// One-line human summary, e.g. `2/3 converted, 1 failed`.
    pub fn summary(&self) -> String {
        format!(
            "{}/{} converted, {} failed",
            self.succeeded.len(),
            self.total,
            self.failed.len()
        )
    }
}

/// Convert each input to `format`, continuing past failures.
///
/// Each output lands beside its source as `<stem>_flat.<ext>`.
pub fn convert_batch(
    inputs: &[PathBuf],
    format: OutputFormat,
    options: &RenderOptions,
) -> BatchResult {
    let mut result = BatchResult {
        total: inputs.len(),
        ..Default::default()
    };

    for input in inputs {
        let request = ConversionRequest::new(input, format);
        match convert_file(&request, options) {
            Ok(()) => {
                result.succeeded.push((input.clone(), request.output));
            }
            Err(e) => {
                error!(input = %input.display(), error = %e, "conversion failed");
                result.failed.push((input.clone(), e));
            }
        }
    }

    info!(summary = %result.summary(), "batch complete");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let mut result = BatchResult::default();
        assert_eq!(result.status(), BatchStatus::Empty);

        result.succeeded.push(("a".into(), "a_flat.txt".into()));
        assert_eq!(result.status(), BatchStatus::AllSucceeded);

        result
            .failed
            .push(("b".into(), Error::Container("bad".into())));
        assert_eq!(result.status(), BatchStatus::Partial);

        result.succeeded.clear();
        assert_eq!(result.status(), BatchStatus::AllFailed);
    }

    #[test]
    fn test_summary_line() {
        let result = BatchResult {
            total: 3,
            succeeded: vec![
                ("a".into(), "a_flat.txt".into()),
                ("c".into(), "c_flat.txt".into()),
            ],
            failed: vec![("b".into(), Error::Container("bad".into()))],
        };
        assert_eq!(result.summary(), "2/3 converted, 1 failed");
    }

    #[test]
    fn test_bad_inputs_do_not_abort() {
        let inputs = vec![PathBuf::from("missing-one.pdf"), PathBuf::from("missing-two.xyz")];
        let result = convert_batch(&inputs, OutputFormat::Text, &RenderOptions::default());
        assert_eq!(result.total, 2);
        assert_eq!(result.failed.len(), 2);
        assert_eq!(result.status(), BatchStatus::AllFailed);
    }
}
