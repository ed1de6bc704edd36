// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for formfill.

use std::fmt;

use thiserror::Error;

/// Pipeline stage in which a composition failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionStage {
    /// Rasterising a text tile.
    TextOverlay,
    /// Decoding or resizing the signature.
    Signature,
    /// Layering tiles onto the template.
    Layering,
    /// Flattening and JPEG encoding.
    Encode,
}

impl fmt::Display for CompositionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompositionStage::TextOverlay => "text overlay",
            CompositionStage::Signature => "signature",
            CompositionStage::Layering => "layering",
            CompositionStage::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all formfill operations.
#[derive(Debug, Error)]
pub enum FormfillError {
    // -- Caller errors --
    #[error("missing required {label} in form data")]
    MissingField { field: String, label: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("signature could not be decoded: {0}")]
    SignatureDecode(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    // -- Internal defects --
    #[error("render failed: {0}")]
    Render(String),

    #[error("template configuration error: {0}")]
    TemplateConfig(String),

    #[error("composition failed during {stage}: {message}")]
    Composition {
        stage: CompositionStage,
        message: String,
    },

    // -- Wrapped --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FormfillError {
    /// Whether the caller can fix this error by changing their input.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            FormfillError::MissingField { .. }
                | FormfillError::InvalidField { .. }
                | FormfillError::SignatureDecode(_)
                | FormfillError::UnknownTemplate(_)
        )
    }

    /// Wrap a lower-layer failure with the stage it happened in.
    ///
    /// Caller errors pass through untouched so the specific field or decode
    /// message survives.
    pub fn in_stage(self, stage: CompositionStage) -> Self {
        if self.is_caller_error() || matches!(self, FormfillError::Composition { .. }) {
            return self;
        }
        FormfillError::Composition {
            stage,
            message: self.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FormfillError>;
