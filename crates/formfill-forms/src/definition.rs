// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Declarative template tables: Which inputs a form takes, how each is
// transformed, and where it lands on the page.

use std::collections::HashSet;

use formfill_core::error::{FormfillError, Result};
use formfill_core::types::{Anchor, Size, TextStyleOverride};
use serde::{Deserialize, Serialize};

const FORM60_TABLE: &str = include_str!("../templates/form60.json");

/// A declared input field of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key in the request's form data.
    pub name: String,
    /// Human name used in validation messages.
    pub label: String,
    #[serde(default)]
    pub required: bool,
    /// Substituted when an optional field is absent or blank.
    #[serde(default)]
    pub default: Option<String>,
}

/// Pure value transform applied before a value is drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// The value as entered.
    #[default]
    Verbatim,
    /// "Yes" or "No" from the value's truthiness.
    YesNo,
    /// Hide all but the last `visible` characters when the paired
    /// document-type field equals `sentinel` (case-insensitive).
    MaskDocumentNumber {
        doc_type_field: String,
        sentinel: String,
        visible: usize,
        mask: String,
    },
    /// Day of month of the consent date.
    ConsentDay,
    /// Full English month name of the consent date.
    ConsentMonth,
    /// en-US date and time of the consent date.
    ConsentTimestamp,
}

impl Transform {
    /// Whether this transform reads the placement's input field.
    pub fn reads_field(&self) -> bool {
        !matches!(
            self,
            Transform::ConsentDay | Transform::ConsentMonth | Transform::ConsentTimestamp
        )
    }
}

/// A value source bound to a fixed position on the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlacement {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub transform: Transform,
    pub anchor: Anchor,
    #[serde(default)]
    pub style: Option<TextStyleOverride>,
}

impl FieldPlacement {
    /// Name used for logs and overlay labels.
    pub fn source_name(&self) -> &str {
        match (&self.field, &self.transform) {
            (Some(field), _) => field,
            (None, Transform::ConsentDay) => "consentDay",
            (None, Transform::ConsentMonth) => "consentMonth",
            (None, Transform::ConsentTimestamp) => "consentTimestamp",
            (None, _) => "unnamed",
        }
    }
}

/// Where the signature goes and which input field carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSlot {
    /// Form-data key holding base64 image bytes.
    pub field: String,
    pub anchor: Anchor,
    pub size: Size,
}

/// Complete description of one fillable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Template image path, relative to the definition file.
    pub image: String,
    /// Template-wide override of the engine's default text style.
    #[serde(default)]
    pub text: Option<TextStyleOverride>,
    pub fields: Vec<FieldSpec>,
    /// Drawn in this order.
    pub placements: Vec<FieldPlacement>,
    #[serde(default)]
    pub signature: Option<SignatureSlot>,
}

impl TemplateDefinition {
    /// The built-in Form 60 table.
    pub fn form60() -> Result<Self> {
        Self::from_json(FORM60_TABLE)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check the table for internal consistency and against the template's
    /// pixel size. Runs once, when a template is registered.
    pub fn validate(&self, size: Size) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(self.config_error("template id must not be empty"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(self.config_error(format!("field '{}' declared twice", field.name)));
            }
        }

        for (index, placement) in self.placements.iter().enumerate() {
            match (&placement.field, placement.transform.reads_field()) {
                (Some(name), _) if self.field(name).is_none() => {
                    return Err(self.config_error(format!(
                        "placement {index} refers to undeclared field '{name}'"
                    )));
                }
                (None, true) => {
                    return Err(self.config_error(format!("placement {index} needs a field")));
                }
                _ => {}
            }
            if let Transform::MaskDocumentNumber { doc_type_field, .. } = &placement.transform {
                if self.field(doc_type_field).is_none() {
                    return Err(self.config_error(format!(
                        "placement {index} masks on undeclared field '{doc_type_field}'"
                    )));
                }
            }
            check_anchor(self, placement.source_name(), placement.anchor, size)?;
        }

        if let Some(slot) = &self.signature {
            if slot.size.width == 0 || slot.size.height == 0 {
                return Err(self.config_error("signature box must be non-empty"));
            }
            check_anchor(self, &slot.field, slot.anchor, size)?;
        }
        Ok(())
    }

    fn config_error(&self, message: impl std::fmt::Display) -> FormfillError {
        FormfillError::TemplateConfig(format!("{}: {}", self.id, message))
    }
}

fn check_anchor(def: &TemplateDefinition, source: &str, anchor: Anchor, size: Size) -> Result<()> {
    if anchor.x < size.width && anchor.y < size.height {
        Ok(())
    } else {
        Err(def.config_error(format!(
            "anchor of '{}' at ({}, {}) lies outside the {}x{} template",
            source, anchor.x, anchor.y, size.width, size.height
        )))
    }
}
