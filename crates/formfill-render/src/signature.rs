// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature normalisation: Decode whatever raster the client sent and fit it
// inside the signature box.

use formfill_core::error::{FormfillError, Result};
use image::RgbaImage;
use image::imageops::FilterType;
use tracing::{debug, instrument};

/// Fits signature images into a target box.
pub struct SignatureNormalizer;

impl SignatureNormalizer {
    /// Decode `data` and resize it to fit inside `target_width` x
    /// `target_height`, preserving aspect ratio.
    ///
    /// The constraining dimension ends up equal to its target and the other
    /// one no larger than its target. Small images are scaled up, nothing is
    /// ever cropped.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn normalize(data: &[u8], target_width: u32, target_height: u32) -> Result<RgbaImage> {
        if target_width == 0 || target_height == 0 {
            return Err(FormfillError::Render(format!(
                "signature box must be non-empty, got {target_width}x{target_height}"
            )));
        }

        let decoded = image::load_from_memory(data)
            .map_err(|err| FormfillError::SignatureDecode(err.to_string()))?;
        debug!(
            from_w = decoded.width(),
            from_h = decoded.height(),
            "Signature decoded"
        );

        let fitted = decoded.resize(target_width, target_height, FilterType::Lanczos3);
        debug!(
            new_w = fitted.width(),
            new_h = fitted.height(),
            "Signature fitted"
        );
        Ok(fitted.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([20, 20, 120, 255]));
        let mut out = Vec::new();
        let dynamic = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        dynamic.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    fn assert_fits(src: (u32, u32), target: (u32, u32)) {
        let out = SignatureNormalizer::normalize(
            &encoded(src.0, src.1, ImageFormat::Png),
            target.0,
            target.1,
        )
        .unwrap();
        let (w, h) = out.dimensions();

        assert!(w <= target.0 && h <= target.1, "{w}x{h} exceeds {target:?}");
        assert!(w == target.0 || h == target.1, "{w}x{h} touches neither edge of {target:?}");

        // The non-constraining side is rounded to the nearest pixel.
        let cross = (w as f64 * src.1 as f64 - h as f64 * src.0 as f64).abs();
        assert!(
            cross <= 0.5 * src.0.max(src.1) as f64,
            "{w}x{h} does not preserve the aspect ratio of {src:?}"
        );
    }

    #[test]
    fn square_into_wide_box_is_height_bound() {
        let out = SignatureNormalizer::normalize(&encoded(400, 400, ImageFormat::Png), 250, 80).unwrap();
        assert_eq!(out.dimensions(), (80, 80));
    }

    #[test]
    fn wide_image_is_width_bound() {
        let out = SignatureNormalizer::normalize(&encoded(1000, 100, ImageFormat::Png), 250, 80).unwrap();
        assert_eq!(out.dimensions(), (250, 25));
    }

    #[test]
    fn small_image_is_scaled_up_to_fit() {
        let out = SignatureNormalizer::normalize(&encoded(50, 20, ImageFormat::Png), 250, 80).unwrap();
        assert_eq!(out.dimensions(), (200, 80));
    }

    #[test]
    fn assorted_aspect_ratios_fit_inside() {
        for src in [(300, 120), (640, 480), (97, 313), (1234, 77), (251, 81)] {
            assert_fits(src, (250, 80));
        }
    }

    #[test]
    fn jpeg_input_is_accepted() {
        let out = SignatureNormalizer::normalize(&encoded(500, 160, ImageFormat::Jpeg), 250, 80).unwrap();
        assert_eq!(out.dimensions(), (250, 80));
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = SignatureNormalizer::normalize(b"definitely not pixels", 250, 80).unwrap_err();
        assert!(matches!(err, FormfillError::SignatureDecode(_)));
    }

    #[test]
    fn empty_box_is_render_error() {
        let err = SignatureNormalizer::normalize(&encoded(10, 10, ImageFormat::Png), 0, 80).unwrap_err();
        assert!(matches!(err, FormfillError::Render(_)));
    }
}
