// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{FormfillError, Result};
use crate::types::TextStyle;

/// What the compositor does with a tile that extends past the template edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Draw the visible part and drop the rest.
    #[default]
    Clip,
    /// Fail the request with a render error.
    Reject,
}

/// Font sources for the text renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Extra font files to load (TTF/OTF/TTC).
    pub files: Vec<PathBuf>,
    /// Also scan the operating system's font directories.
    pub load_system_fonts: bool,
    /// CSS-style font family list used in text tiles.
    pub family: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            load_system_fonts: true,
            family: "Arial, sans-serif".into(),
        }
    }
}

/// Settings for the whole fill pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding template definitions (`*.json`) and their images.
    pub template_dir: PathBuf,
    pub fonts: FontConfig,
    /// Default style for every text tile; templates may override it.
    pub text: TextStyle,
    /// JPEG quality of the flattened output (1-100).
    pub jpeg_quality: u8,
    pub overflow: OverflowPolicy,
    /// Offset from UTC used when formatting consent dates (default IST).
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            fonts: FontConfig::default(),
            text: TextStyle::default(),
            jpeg_quality: 90,
            overflow: OverflowPolicy::Clip,
            utc_offset_minutes: 330,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can only be configuration mistakes.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FormfillError::TemplateConfig(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        self.utc_offset()?;
        Ok(())
    }

    /// The consent-date time zone as a chrono offset.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            FormfillError::TemplateConfig(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}
