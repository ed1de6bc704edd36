// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the formfill compositor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FormfillError, Result};

/// Correlation id for a single composition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-left pixel coordinate of an overlay on the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: u32,
    pub y: u32,
}

impl Anchor {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Fully resolved visual style of a text tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Tile width in pixels. Text longer than this is clipped.
    pub box_width: u32,
    /// Tile height in pixels.
    pub box_height: u32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Fill colour as an SVG paint token (`black`, `#1a1a1a`, `rgb(0,0,0)`).
    pub color: String,
    /// Inset of the text from the tile's top-left corner.
    pub padding: f32,
    /// Stroke colour of the debug outline; `None` leaves it invisible.
    pub outline: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            box_width: 700,
            box_height: 60,
            font_size: 22.0,
            color: "black".into(),
            padding: 5.0,
            outline: None,
        }
    }
}

/// Partial style used by template tables to override the engine default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyleOverride {
    pub box_width: Option<u32>,
    pub box_height: Option<u32>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub padding: Option<f32>,
    pub outline: Option<String>,
}

impl TextStyleOverride {
    /// Layer this override on top of `base`.
    pub fn apply(&self, base: &TextStyle) -> TextStyle {
        TextStyle {
            box_width: self.box_width.unwrap_or(base.box_width),
            box_height: self.box_height.unwrap_or(base.box_height),
            font_size: self.font_size.unwrap_or(base.font_size),
            color: self.color.clone().unwrap_or_else(|| base.color.clone()),
            padding: self.padding.unwrap_or(base.padding),
            outline: self.outline.clone().or_else(|| base.outline.clone()),
        }
    }
}

/// A positioned, display-ready piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    /// Field (or derived value) this element was produced from.
    pub source: String,
    pub text: String,
    pub anchor: Anchor,
    pub style: TextStyle,
}

/// A signature image waiting to be normalised and placed.
///
/// Only constructed when signature bytes are actually present.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureOverlay {
    pub image_bytes: Vec<u8>,
    pub anchor: Anchor,
    pub target: Size,
}

/// A raw form input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value, rejecting arrays and objects.
    pub fn from_json(field: &str, value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(FieldValue::Null),
            serde_json::Value::Bool(b) => Ok(FieldValue::Bool(b)),
            serde_json::Value::Number(n) => Ok(FieldValue::Number(n)),
            serde_json::Value::String(s) => Ok(FieldValue::Text(s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(FormfillError::InvalidField {
                    field: field.to_owned(),
                    reason: "expected a string, number, or boolean".into(),
                })
            }
        }
    }

    /// Whether this value counts as supplied for a required field.
    ///
    /// Null, blank text, `false` and numeric zero are missing.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        }
    }

    /// Truthiness used by yes/no fields.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            FieldValue::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "1"
            ),
        }
    }

    /// Render the value as display text.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => display_number(n),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

/// Integral floats print without a fractional part, so `50000.0` reads `50000`.
fn display_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(v) if n.is_f64() && v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        _ => n.to_string(),
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One request to fill a template. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct CompositionRequest {
    pub request_id: RequestId,
    pub template_id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl CompositionRequest {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            template_id: template_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build a request from a JSON `formData` object.
    pub fn from_form_data(template_id: impl Into<String>, form_data: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = form_data else {
            return Err(FormfillError::InvalidField {
                field: "formData".into(),
                reason: "expected a JSON object".into(),
            });
        };
        let mut request = Self::new(template_id);
        for (name, value) in map {
            let value = FieldValue::from_json(&name, value)?;
            request.fields.insert(name, value);
        }
        Ok(request)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_text_is_not_present() {
        assert!(!FieldValue::Text("   ".into()).is_present());
        assert!(!FieldValue::Null.is_present());
        assert!(FieldValue::Text("x".into()).is_present());
    }

    #[test]
    fn zero_and_false_are_not_present() {
        assert!(!FieldValue::Bool(false).is_present());
        assert!(!FieldValue::Number(0.into()).is_present());
        assert!(!FieldValue::from_json("policyAmount", json!(0.0)).unwrap().is_present());
        assert!(FieldValue::Bool(true).is_present());
        assert!(FieldValue::Number(5.into()).is_present());
    }

    #[test]
    fn truthiness_of_text_tokens() {
        assert!(FieldValue::Text("Yes".into()).is_truthy());
        assert!(FieldValue::Text("true".into()).is_truthy());
        assert!(!FieldValue::Text("no".into()).is_truthy());
        assert!(!FieldValue::Text("false".into()).is_truthy());
        assert!(FieldValue::Number(1.into()).is_truthy());
        assert!(!FieldValue::Number(0.into()).is_truthy());
    }

    #[test]
    fn numbers_display_without_quotes() {
        let value = FieldValue::from_json("policyAmount", json!(50000)).unwrap();
        assert_eq!(value.display(), "50000");
    }

    #[test]
    fn integral_floats_display_as_integers() {
        let whole = FieldValue::from_json("policyAmount", json!(50000.0)).unwrap();
        assert_eq!(whole.display(), "50000");
        let fractional = FieldValue::from_json("policyAmount", json!(1250.5)).unwrap();
        assert_eq!(fractional.display(), "1250.5");
    }

    #[test]
    fn form_data_rejects_nested_values() {
        let err = CompositionRequest::from_form_data("form60", json!({ "address": ["a", "b"] }))
            .unwrap_err();
        match err {
            FormfillError::InvalidField { field, .. } => assert_eq!(field, "address"),
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn form_data_must_be_object() {
        assert!(CompositionRequest::from_form_data("form60", json!("nope")).is_err());
    }

    #[test]
    fn style_override_layers_on_base() {
        let base = TextStyle::default();
        let over = TextStyleOverride {
            font_size: Some(18.0),
            outline: Some("red".into()),
            ..Default::default()
        };
        let style = over.apply(&base);
        assert_eq!(style.font_size, 18.0);
        assert_eq!(style.box_width, 700);
        assert_eq!(style.outline.as_deref(), Some("red"));
    }
}
