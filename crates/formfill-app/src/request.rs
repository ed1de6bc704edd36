// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request files and response envelopes.

use std::path::Path;

use formfill_core::error::{FormfillError, Result};
use formfill_core::human_errors::{Severity, humanize_error};
use formfill_core::types::{CompositionRequest, RequestId};
use serde::Serialize;

/// Read a request file.
///
/// Accepts `{ "template": "...", "formData": { ... } }` or a bare form-data
/// object, in which case `default_template` is used.
pub fn read_request(path: &Path, default_template: &str) -> Result<CompositionRequest> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    parse_request(value, default_template)
}

pub fn parse_request(value: serde_json::Value, default_template: &str) -> Result<CompositionRequest> {
    let serde_json::Value::Object(mut map) = value else {
        return Err(FormfillError::InvalidField {
            field: "formData".into(),
            reason: "expected a JSON object".into(),
        });
    };

    match map.remove("formData") {
        Some(form_data) => {
            let template = match map.remove("template") {
                Some(serde_json::Value::String(id)) => id,
                Some(_) => {
                    return Err(FormfillError::InvalidField {
                        field: "template".into(),
                        reason: "expected a string".into(),
                    });
                }
                None => default_template.to_owned(),
            };
            CompositionRequest::from_form_data(template, form_data)
        }
        None => CompositionRequest::from_form_data(default_template, serde_json::Value::Object(map)),
    }
}

/// JSON body returned for every request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub error: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Envelope {
    pub fn success(request_id: RequestId, image_base64: String) -> Self {
        Self {
            error: false,
            request_id: request_id.to_string(),
            message: None,
            image: Some(image_base64),
        }
    }

    /// Log the full error and keep only the caller-facing message.
    pub fn failure(request_id: RequestId, err: &FormfillError) -> Self {
        let human = humanize_error(err);
        match human.severity {
            Severity::CallerFixable => {
                tracing::warn!(%request_id, status = human.status, error = %err, "Request rejected");
            }
            Severity::Internal => {
                tracing::error!(%request_id, status = human.status, error = %err, "Request failed");
            }
        }
        Self {
            error: true,
            request_id: request_id.to_string(),
            message: Some(human.message),
            image: None,
        }
    }
}
