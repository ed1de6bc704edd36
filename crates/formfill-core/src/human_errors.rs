// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-facing error messages.
//
// Validation failures keep their specific wording so clients can fix their
// input. Internal failures collapse to one opaque message; the detail goes to
// the logs, not to the client.

use crate::error::FormfillError;

/// Who has to act to resolve an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The caller sent bad input and can resend.
    CallerFixable,
    /// A template, font, or encoder defect; operators need to look.
    Internal,
}

/// A caller-facing error with an HTTP-style status code.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// HTTP-equivalent status (400, 404, 500).
    pub status: u16,
    /// Message safe to return to external clients.
    pub message: String,
    pub severity: Severity,
}

const INTERNAL_MESSAGE: &str = "Error processing image";

/// Convert a `FormfillError` into what the client gets to see.
pub fn humanize_error(err: &FormfillError) -> HumanError {
    match err {
        FormfillError::MissingField { .. } | FormfillError::InvalidField { .. } => HumanError {
            status: 400,
            message: err.to_string(),
            severity: Severity::CallerFixable,
        },

        FormfillError::SignatureDecode(_) => HumanError {
            status: 400,
            message: "The signature image could not be read. Send a base64-encoded PNG or JPEG."
                .into(),
            severity: Severity::CallerFixable,
        },

        FormfillError::UnknownTemplate(id) => HumanError {
            status: 404,
            message: format!("No form template named '{id}'"),
            severity: Severity::CallerFixable,
        },

        FormfillError::Render(_)
        | FormfillError::TemplateConfig(_)
        | FormfillError::Composition { .. }
        | FormfillError::Io(_)
        | FormfillError::Serialization(_) => HumanError {
            status: 500,
            message: INTERNAL_MESSAGE.into(),
            severity: Severity::Internal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompositionStage;

    #[test]
    fn missing_field_keeps_field_name() {
        let err = FormfillError::MissingField {
            field: "address".into(),
            label: "Address".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.status, 400);
        assert_eq!(human.severity, Severity::CallerFixable);
        assert!(human.message.contains("Address"));
    }

    #[test]
    fn composition_failure_is_opaque() {
        let err = FormfillError::Composition {
            stage: CompositionStage::Encode,
            message: "jpeg encoder exploded at row 17".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.status, 500);
        assert_eq!(human.severity, Severity::Internal);
        assert!(!human.message.contains("row 17"));
    }

    #[test]
    fn unknown_template_is_not_found() {
        let human = humanize_error(&FormfillError::UnknownTemplate("form99".into()));
        assert_eq!(human.status, 404);
    }
}
