// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template documents: The immutable base raster of a blank form.

use std::path::Path;

use formfill_core::error::{FormfillError, Result};
use formfill_core::types::{Anchor, Size};
use image::RgbaImage;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

/// Decoded base image of a form.
///
/// Never mutated after construction, so one instance can be shared behind an
/// `Arc` by every request that fills this form.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    id: String,
    image: RgbaImage,
    /// SHA-256 of the bytes the template was loaded from.
    fingerprint: String,
}

impl TemplateDocument {
    /// Load a template image from disk.
    #[instrument(skip_all, fields(id = %id.as_ref(), path = %path.as_ref().display()))]
    pub fn open(id: impl AsRef<str>, path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref()).map_err(|err| {
            FormfillError::TemplateConfig(format!(
                "failed to read template image {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Self::from_bytes(id.as_ref(), &data)
    }

    /// Decode a template from encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(id: &str, data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            FormfillError::TemplateConfig(format!("failed to decode template {id}: {err}"))
        })?;
        let doc = Self {
            id: id.to_owned(),
            image: image.to_rgba8(),
            fingerprint: hash_bytes(data),
        };
        info!(
            width = doc.width(),
            height = doc.height(),
            fingerprint = %doc.fingerprint,
            "Template loaded"
        );
        Ok(doc)
    }

    /// Wrap an already-decoded raster. The fingerprint covers the raw pixels.
    pub fn from_image(id: &str, image: RgbaImage) -> Self {
        let fingerprint = hash_bytes(image.as_raw());
        Self {
            id: id.to_owned(),
            image,
            fingerprint,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether `anchor` addresses a pixel inside the template.
    pub fn contains(&self, anchor: Anchor) -> bool {
        anchor.x < self.width() && anchor.y < self.height()
    }
}

/// SHA-256 of `data` as lowercase hex.
fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn from_bytes_reports_dimensions_and_fingerprint() {
        let data = png_bytes(40, 30);
        let doc = TemplateDocument::from_bytes("form60", &data).unwrap();
        assert_eq!(doc.size(), Size::new(40, 30));
        assert_eq!(doc.fingerprint(), hash_bytes(&data));
        assert_eq!(doc.fingerprint().len(), 64);
    }

    #[test]
    fn contains_excludes_the_far_edge() {
        let doc = TemplateDocument::from_image("t", RgbaImage::new(10, 10));
        assert!(doc.contains(Anchor::new(0, 0)));
        assert!(doc.contains(Anchor::new(9, 9)));
        assert!(!doc.contains(Anchor::new(10, 0)));
        assert!(!doc.contains(Anchor::new(0, 10)));
    }

    #[test]
    fn undecodable_template_is_config_error() {
        let err = TemplateDocument::from_bytes("broken", b"not an image").unwrap_err();
        assert!(matches!(err, FormfillError::TemplateConfig(_)));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = TemplateDocument::open("gone", "/nonexistent/Form60.jpg").unwrap_err();
        assert!(matches!(err, FormfillError::TemplateConfig(_)));
    }
}
