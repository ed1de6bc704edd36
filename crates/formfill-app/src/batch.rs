// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parallel batch filling. Each request file is handled end to end by one
// rayon worker; the filler is shared read-only.

use std::path::{Path, PathBuf};

use formfill_core::error::Result;
use formfill_core::types::RequestId;
use formfill_forms::FormFiller;
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::request::{Envelope, read_request};

/// Outcome counts of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub filled: usize,
    pub failed: usize,
}

/// Fill every `*.json` request in `input_dir`, writing `<stem>.jpg` on
/// success or `<stem>.error.json` on failure into `output_dir`.
#[instrument(skip_all, fields(input = %input_dir.display(), output = %output_dir.display()))]
pub fn run_batch(
    filler: &FormFiller,
    input_dir: &Path,
    output_dir: &Path,
    default_template: &str,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)?;

    let mut inputs: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            inputs.push(path);
        }
    }
    inputs.sort();
    info!(requests = inputs.len(), "Batch started");

    let outcomes = inputs
        .par_iter()
        .map(|path| fill_one(filler, path, output_dir, default_template))
        .collect::<Vec<_>>();

    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        if outcome? {
            summary.filled += 1;
        } else {
            summary.failed += 1;
        }
    }
    info!(filled = summary.filled, failed = summary.failed, "Batch finished");
    Ok(summary)
}

/// Returns `Ok(true)` when an image was written, `Ok(false)` when an error
/// envelope was written instead. Only output I/O failures are errors.
fn fill_one(filler: &FormFiller, path: &Path, output_dir: &Path, default_template: &str) -> Result<bool> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "request".into());

    let (request_id, result) = match read_request(path, default_template) {
        Ok(request) => (request.request_id, filler.fill(&request)),
        Err(err) => (RequestId::new(), Err(err)),
    };

    match result {
        Ok(image) => {
            std::fs::write(output_dir.join(format!("{stem}.jpg")), image.as_bytes())?;
            Ok(true)
        }
        Err(err) => {
            let envelope = Envelope::failure(request_id, &err);
            let body = serde_json::to_vec_pretty(&envelope)?;
            std::fs::write(output_dir.join(format!("{stem}.error.json")), body)?;
            Ok(false)
        }
    }
}
