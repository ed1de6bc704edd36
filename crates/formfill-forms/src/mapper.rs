// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field mapper: Turns raw form data into positioned text and an optional
// signature overlay, following a template's declarative table.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, Utc};
use formfill_core::config::EngineConfig;
use formfill_core::error::{FormfillError, Result};
use formfill_core::types::{CompositionRequest, FieldValue, SignatureOverlay, TextElement, TextStyle};
use tracing::{debug, instrument};

use crate::definition::{FieldPlacement, TemplateDefinition, Transform};

/// Output of the mapper: everything the renderer and compositor need.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedForm {
    /// In the template's declared placement order.
    pub elements: Vec<TextElement>,
    pub signature: Option<SignatureOverlay>,
}

/// Resolves requests against template tables. Pure apart from logging.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    base_style: TextStyle,
    offset: FixedOffset,
}

/// The three views of the consent date.
struct ConsentDate {
    day: String,
    month: String,
    timestamp: String,
}

impl ConsentDate {
    fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = now.with_timezone(&offset);
        Self {
            day: local.format("%-d").to_string(),
            month: local.format("%B").to_string(),
            timestamp: local.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        }
    }
}

impl FieldMapper {
    pub fn new(base_style: TextStyle, offset: FixedOffset) -> Self {
        Self { base_style, offset }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(config.text.clone(), config.utc_offset()?))
    }

    /// Validate `request` against `definition` and resolve every placement.
    ///
    /// Fails on the first missing required field, in declaration order,
    /// before anything is rendered.
    #[instrument(skip_all, fields(template = %definition.id, fields = request.fields.len()))]
    pub fn map(
        &self,
        definition: &TemplateDefinition,
        request: &CompositionRequest,
        now: DateTime<Utc>,
    ) -> Result<MappedForm> {
        for spec in definition.fields.iter().filter(|f| f.required) {
            if !request.get(&spec.name).is_some_and(FieldValue::is_present) {
                return Err(FormfillError::MissingField {
                    field: spec.name.clone(),
                    label: spec.label.clone(),
                });
            }
        }

        let consent = ConsentDate::new(now, self.offset);
        let template_style = match &definition.text {
            Some(over) => over.apply(&self.base_style),
            None => self.base_style.clone(),
        };

        let elements = definition
            .placements
            .iter()
            .map(|placement| TextElement {
                source: placement.source_name().to_owned(),
                text: resolve(definition, placement, request, &consent),
                anchor: placement.anchor,
                style: match &placement.style {
                    Some(over) => over.apply(&template_style),
                    None => template_style.clone(),
                },
            })
            .collect::<Vec<_>>();

        let signature = match &definition.signature {
            Some(slot) => decode_signature(request.get(&slot.field), &slot.field)?.map(|image_bytes| {
                SignatureOverlay {
                    image_bytes,
                    anchor: slot.anchor,
                    target: slot.size,
                }
            }),
            None => None,
        };

        debug!(
            elements = elements.len(),
            signature = signature.is_some(),
            "Form data mapped"
        );
        Ok(MappedForm { elements, signature })
    }
}

/// Compute the display string of one placement.
fn resolve(
    definition: &TemplateDefinition,
    placement: &FieldPlacement,
    request: &CompositionRequest,
    consent: &ConsentDate,
) -> String {
    let raw = placement
        .field
        .as_deref()
        .and_then(|name| request.get(name))
        .filter(|value| !value.display().trim().is_empty());
    let fallback = || {
        placement
            .field
            .as_deref()
            .and_then(|name| definition.field(name))
            .and_then(|spec| spec.default.clone())
            .unwrap_or_default()
    };

    match &placement.transform {
        Transform::Verbatim => raw.map(FieldValue::display).unwrap_or_else(fallback),
        Transform::YesNo => {
            if raw.is_some_and(FieldValue::is_truthy) {
                "Yes".into()
            } else {
                "No".into()
            }
        }
        Transform::MaskDocumentNumber {
            doc_type_field,
            sentinel,
            visible,
            mask,
        } => {
            let number = raw.map(FieldValue::display).unwrap_or_else(fallback);
            let doc_type = request.get(doc_type_field).map(FieldValue::display).unwrap_or_default();
            if matches_sentinel(&doc_type, sentinel) {
                mask_tail(&number, *visible, mask)
            } else {
                number
            }
        }
        Transform::ConsentDay => consent.day.clone(),
        Transform::ConsentMonth => consent.month.clone(),
        Transform::ConsentTimestamp => consent.timestamp.clone(),
    }
}

fn matches_sentinel(value: &str, sentinel: &str) -> bool {
    value.trim().to_lowercase() == sentinel.trim().to_lowercase()
}

/// `mask` followed by the last `visible` characters of `value`.
pub fn mask_tail(value: &str, visible: usize, mask: &str) -> String {
    let count = value.chars().count();
    let tail: String = value.chars().skip(count.saturating_sub(visible)).collect();
    format!("{mask}{tail}")
}

/// Pull raw image bytes out of the signature field, if any were sent.
///
/// Accepts plain base64 or a `data:` URL; whitespace is ignored.
fn decode_signature(value: Option<&FieldValue>, field: &str) -> Result<Option<Vec<u8>>> {
    let encoded = match value {
        None | Some(FieldValue::Null) => return Ok(None),
        Some(FieldValue::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(FieldValue::Text(text)) => text,
        Some(_) => {
            return Err(FormfillError::InvalidField {
                field: field.to_owned(),
                reason: "expected base64 image data".into(),
            });
        }
    };

    let payload = match encoded.trim().strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => encoded.as_str(),
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| FormfillError::SignatureDecode(format!("invalid base64: {err}")))?;
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mapper() -> FieldMapper {
        FieldMapper::from_config(&EngineConfig::default()).unwrap()
    }

    fn frozen_now() -> DateTime<Utc> {
        // 2024-03-05 09:15:30 IST
        Utc.with_ymd_and_hms(2024, 3, 5, 3, 45, 30).unwrap()
    }

    fn complete_request() -> CompositionRequest {
        CompositionRequest::new("form60")
            .with_field("customerName", "A. Kumar")
            .with_field("address", "12 MG Road")
            .with_field("policyAmount", "50000")
            .with_field("assessedToTax", false)
            .with_field("supportDocType", "Aadhaar Card")
            .with_field("supportDocNo", "123456789012")
            .with_field("dealerState", "Karnataka")
    }

    fn text_of<'a>(form: &'a MappedForm, x: u32, y: u32) -> &'a str {
        form.elements
            .iter()
            .find(|e| e.anchor.x == x && e.anchor.y == y)
            .map(|e| e.text.as_str())
            .unwrap()
    }

    #[test]
    fn each_missing_required_field_is_named() {
        let def = TemplateDefinition::form60().unwrap();
        for spec in def.fields.iter().filter(|f| f.required) {
            let mut request = complete_request();
            request.fields.remove(&spec.name);
            match mapper().map(&def, &request, frozen_now()) {
                Err(FormfillError::MissingField { field, label }) => {
                    assert_eq!(field, spec.name);
                    assert_eq!(label, spec.label);
                }
                other => panic!("expected MissingField for {}, got {other:?}", spec.name),
            }
        }
    }

    #[test]
    fn blank_required_field_counts_as_missing() {
        let def = TemplateDefinition::form60().unwrap();
        let request = complete_request().with_field("address", "  ");
        let err = mapper().map(&def, &request, frozen_now()).unwrap_err();
        assert!(matches!(err, FormfillError::MissingField { ref field, .. } if field == "address"));
    }

    #[test]
    fn zero_policy_amount_counts_as_missing() {
        let def = TemplateDefinition::form60().unwrap();
        let request = complete_request().with_field("policyAmount", FieldValue::Number(0.into()));
        let err = mapper().map(&def, &request, frozen_now()).unwrap_err();
        assert!(matches!(err, FormfillError::MissingField { ref field, .. } if field == "policyAmount"));
    }

    #[test]
    fn float_policy_amount_renders_as_integer() {
        let def = TemplateDefinition::form60().unwrap();
        let amount = FieldValue::from_json("policyAmount", serde_json::json!(50000.0)).unwrap();
        let request = complete_request().with_field("policyAmount", amount);
        let form = mapper().map(&def, &request, frozen_now()).unwrap();
        assert_eq!(text_of(&form, 430, 526), "50000");
    }

    #[test]
    fn empty_form_data_fails_validation() {
        let def = TemplateDefinition::form60().unwrap();
        let request = CompositionRequest::new("form60");
        let err = mapper().map(&def, &request, frozen_now()).unwrap_err();
        assert!(matches!(err, FormfillError::MissingField { ref field, .. } if field == "customerName"));
    }

    #[test]
    fn aadhaar_number_is_masked_case_insensitively() {
        let def = TemplateDefinition::form60().unwrap();
        for doc_type in ["Aadhaar Card", "aadhaar card", "AADHAAR CARD"] {
            let request = complete_request().with_field("supportDocType", doc_type);
            let form = mapper().map(&def, &request, frozen_now()).unwrap();
            assert_eq!(text_of(&form, 360, 780), "********9012");
        }
    }

    #[test]
    fn other_documents_are_not_masked() {
        let def = TemplateDefinition::form60().unwrap();
        for doc_type in ["Passport", "Voter ID", "Aadhaar"] {
            let request = complete_request()
                .with_field("supportDocType", doc_type)
                .with_field("supportDocNo", "Z1234567");
            let form = mapper().map(&def, &request, frozen_now()).unwrap();
            assert_eq!(text_of(&form, 360, 780), "Z1234567");
        }
    }

    #[test]
    fn mask_tail_handles_short_values() {
        assert_eq!(mask_tail("123", 4, "****"), "****123");
        assert_eq!(mask_tail("ab12345678", 4, "********"), "********5678");
    }

    #[test]
    fn consent_date_has_three_anchors() {
        let def = TemplateDefinition::form60().unwrap();
        let form = mapper().map(&def, &complete_request(), frozen_now()).unwrap();
        assert_eq!(text_of(&form, 290, 985), "5");
        assert_eq!(text_of(&form, 570, 985), "March");
        assert_eq!(text_of(&form, 190, 1025), "3/5/2024, 9:15:30 AM");
    }

    #[test]
    fn consent_date_follows_configured_offset() {
        let def = TemplateDefinition::form60().unwrap();
        let utc = FieldMapper::new(TextStyle::default(), FixedOffset::east_opt(0).unwrap());
        // 23:30 UTC on the 4th is already the 5th in India.
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        let form = utc.map(&def, &complete_request(), now).unwrap();
        assert_eq!(text_of(&form, 290, 985), "4");
        let form = mapper().map(&def, &complete_request(), now).unwrap();
        assert_eq!(text_of(&form, 290, 985), "5");
        assert_eq!(text_of(&form, 190, 1025), "3/5/2024, 5:00:00 AM");
    }

    #[test]
    fn yes_no_and_default_substitution() {
        let def = TemplateDefinition::form60().unwrap();
        let form = mapper().map(&def, &complete_request(), frozen_now()).unwrap();
        assert_eq!(text_of(&form, 890, 570), "No");
        assert_eq!(text_of(&form, 1010, 699), "");

        let request = complete_request()
            .with_field("assessedToTax", true)
            .with_field("reason", "No PAN allotted");
        let form = mapper().map(&def, &request, frozen_now()).unwrap();
        assert_eq!(text_of(&form, 890, 570), "Yes");
        assert_eq!(text_of(&form, 1010, 699), "No PAN allotted");
    }

    #[test]
    fn elements_follow_declared_order() {
        let def = TemplateDefinition::form60().unwrap();
        let form = mapper().map(&def, &complete_request(), frozen_now()).unwrap();
        let anchors: Vec<_> = form.elements.iter().map(|e| e.anchor).collect();
        let declared: Vec<_> = def.placements.iter().map(|p| p.anchor).collect();
        assert_eq!(anchors, declared);
        assert_eq!(form.elements[0].source, "customerName");
        assert_eq!(form.elements[0].style, TextStyle::default());
    }

    #[test]
    fn absent_signature_produces_no_overlay() {
        let def = TemplateDefinition::form60().unwrap();
        let form = mapper().map(&def, &complete_request(), frozen_now()).unwrap();
        assert!(form.signature.is_none());

        let request = complete_request().with_field("signatureImg", "");
        let form = mapper().map(&def, &request, frozen_now()).unwrap();
        assert!(form.signature.is_none());
    }

    #[test]
    fn signature_base64_and_data_url_are_decoded() {
        let def = TemplateDefinition::form60().unwrap();
        let request = complete_request().with_field("signatureImg", "aGVs\nbG8=");
        let form = mapper().map(&def, &request, frozen_now()).unwrap();
        let sig = form.signature.unwrap();
        assert_eq!(sig.image_bytes, b"hello");
        assert_eq!((sig.target.width, sig.target.height), (250, 80));

        let request = complete_request().with_field("signatureImg", "data:image/png;base64,aGVsbG8=");
        let form = mapper().map(&def, &request, frozen_now()).unwrap();
        assert_eq!(form.signature.unwrap().image_bytes, b"hello");
    }

    #[test]
    fn bad_base64_is_signature_error() {
        let def = TemplateDefinition::form60().unwrap();
        let request = complete_request().with_field("signatureImg", "%%% not base64 %%%");
        let err = mapper().map(&def, &request, frozen_now()).unwrap_err();
        assert!(matches!(err, FormfillError::SignatureDecode(_)));
    }
}
