// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositor: Layers text tiles and the signature onto a template and
// flattens the result to JPEG.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use formfill_core::config::{EngineConfig, OverflowPolicy};
use formfill_core::error::{CompositionStage, FormfillError, Result};
use formfill_core::types::Anchor;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use imageproc::rect::Rect;
use tracing::{debug, info, instrument, warn};

use crate::template::TemplateDocument;

/// One raster tile and where its top-left corner goes.
#[derive(Debug, Clone)]
pub struct Overlay {
    /// Name used in logs and errors (usually the field name).
    pub label: String,
    pub tile: RgbaImage,
    pub left: i64,
    pub top: i64,
}

impl Overlay {
    pub fn new(label: impl Into<String>, tile: RgbaImage, anchor: Anchor) -> Self {
        Self {
            label: label.into(),
            tile,
            left: i64::from(anchor.x),
            top: i64::from(anchor.y),
        }
    }
}

/// Flattened, encoded output of one composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionResult {
    jpeg: Vec<u8>,
}

impl CompositionResult {
    pub fn as_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.jpeg
    }

    /// Standard base64 of the JPEG bytes, as returned to HTTP callers.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

/// Layers overlays onto templates.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    quality: u8,
    overflow: OverflowPolicy,
}

impl Compositor {
    pub fn new(quality: u8, overflow: OverflowPolicy) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            overflow,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.jpeg_quality, config.overflow)
    }

    /// Composite `overlays` in order over `template` and encode the result.
    ///
    /// Placement is checked for every overlay before any pixel is touched, so
    /// a rejected overlay never leaves partial work behind.
    #[instrument(skip_all, fields(template = template.id(), overlays = overlays.len(), quality = self.quality))]
    pub fn compose(&self, template: &TemplateDocument, overlays: &[Overlay]) -> Result<CompositionResult> {
        for overlay in overlays {
            self.check_placement(template, overlay)?;
        }

        let mut canvas = template.image().clone();
        for overlay in overlays {
            image::imageops::overlay(&mut canvas, &overlay.tile, overlay.left, overlay.top);
        }

        let flattened = flatten_on_white(&canvas);
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        flattened.write_with_encoder(encoder).map_err(|err| FormfillError::Composition {
            stage: CompositionStage::Encode,
            message: format!("JPEG encoding failed: {err}"),
        })?;

        info!(bytes = jpeg.len(), "Composition encoded");
        Ok(CompositionResult { jpeg })
    }

    fn check_placement(&self, template: &TemplateDocument, overlay: &Overlay) -> Result<()> {
        let (w, h) = overlay.tile.dimensions();
        if w == 0 || h == 0 {
            return Ok(());
        }

        let left = i32::try_from(overlay.left).map_err(|_| offset_error(overlay))?;
        let top = i32::try_from(overlay.top).map_err(|_| offset_error(overlay))?;
        let bounds = Rect::at(0, 0).of_size(template.width(), template.height());
        let tile = Rect::at(left, top).of_size(w, h);

        if bounds.intersect(tile) == Some(tile) {
            return Ok(());
        }
        match self.overflow {
            OverflowPolicy::Clip => {
                debug!(
                    label = %overlay.label,
                    left,
                    top,
                    width = w,
                    height = h,
                    "Overlay extends past template edge; clipping"
                );
                Ok(())
            }
            OverflowPolicy::Reject => {
                warn!(label = %overlay.label, left, top, "Overlay rejected: outside template");
                Err(FormfillError::Render(format!(
                    "overlay '{}' at ({left}, {top}) size {w}x{h} extends outside the {}x{} template",
                    overlay.label,
                    template.width(),
                    template.height()
                )))
            }
        }
    }
}

fn offset_error(overlay: &Overlay) -> FormfillError {
    FormfillError::Render(format!(
        "overlay '{}' offset ({}, {}) is out of range",
        overlay.label, overlay.left, overlay.top
    ))
}

/// Drop the alpha channel by blending over a white page.
fn flatten_on_white(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let [r, g, b, a] = canvas.get_pixel(x, y).0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
