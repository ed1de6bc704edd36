// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text tiles: Each field value becomes a fixed-size transparent raster built
// from a small SVG description and rasterised with resvg.

use std::sync::Arc;

use formfill_core::config::FontConfig;
use formfill_core::error::{FormfillError, Result};
use formfill_core::types::{TextElement, TextStyle};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use tracing::{debug, info, instrument, warn};

/// Rasterises text into fixed-size tiles.
///
/// The font database is built once and shared read-only, so one renderer can
/// serve any number of threads.
pub struct TextRenderer {
    fontdb: Arc<fontdb::Database>,
    family: String,
}

impl TextRenderer {
    // -- Construction ---------------------------------------------------------

    /// Build the font database from configured files and, optionally, the
    /// system font directories.
    #[instrument(skip_all, fields(files = config.files.len(), system = config.load_system_fonts))]
    pub fn new(config: &FontConfig) -> Result<Self> {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for path in &config.files {
            db.load_font_file(path).map_err(|err| {
                FormfillError::Render(format!("failed to load font {}: {}", path.display(), err))
            })?;
        }

        if db.faces().next().is_none() {
            warn!("No font faces available; text tiles will render without glyphs");
        } else {
            if !resolves(&db, fontdb::Family::SansSerif) {
                if let Some(name) = fallback_family(&db) {
                    debug!(family = %name, "Generic sans-serif remapped to a loaded face");
                    db.set_sans_serif_family(name);
                }
            }
            if !requested_families(&config.family)
                .iter()
                .any(|family| resolves(&db, *family))
            {
                warn!(family = %config.family, "Configured font family matches no loaded face");
            }
        }
        info!(faces = db.len(), family = %config.family, "Font database ready");

        Ok(Self {
            fontdb: Arc::new(db),
            family: config.family.clone(),
        })
    }

    /// Number of font faces available to the renderer.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    // -- Rendering ------------------------------------------------------------

    /// Render a resolved text element.
    pub fn render_element(&self, element: &TextElement) -> Result<RgbaImage> {
        self.render(&element.text, &element.style)
    }

    /// Render `text` into a transparent tile of exactly
    /// `style.box_width` x `style.box_height` pixels.
    ///
    /// Text that does not fit is clipped by the tile edge.
    #[instrument(skip_all, fields(chars = text.chars().count(), width = style.box_width, height = style.box_height))]
    pub fn render(&self, text: &str, style: &TextStyle) -> Result<RgbaImage> {
        let svg = self.svg_description(text, style)?;

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(&svg, &options).map_err(|err| {
            FormfillError::Render(format!("text overlay description rejected: {err}"))
        })?;

        let mut pixmap = Pixmap::new(style.box_width, style.box_height).ok_or_else(|| {
            FormfillError::Render(format!(
                "failed to allocate {}x{} text tile",
                style.box_width, style.box_height
            ))
        })?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        debug!("Text tile rasterised");
        Ok(pixmap_to_rgba(&pixmap))
    }

    /// Build the SVG description of a text tile.
    ///
    /// All caller-supplied text is escaped; colours must be plain paint tokens.
    pub fn svg_description(&self, text: &str, style: &TextStyle) -> Result<String> {
        validate_style(style)?;

        let width = style.box_width;
        let height = style.box_height;
        let padding = style.padding;
        let band = style.font_size + padding;
        let rect_width = (width as f32 - 2.0 * padding).max(0.0);
        let baseline = band / 2.0 + padding;
        let stroke = style.outline.as_deref().unwrap_or("none");

        Ok(format!(
            concat!(
                r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
                r#"<rect x="{p}" y="{p}" width="{rw}" height="{band}" fill="none" stroke="{stroke}" stroke-width="1"/>"#,
                r#"<text x="{p}" y="{y}" font-size="{fs}" font-family="{family}" fill="{color}" dominant-baseline="middle" text-anchor="start">{text}</text>"#,
                "</svg>"
            ),
            w = width,
            h = height,
            p = padding,
            rw = rect_width,
            band = band,
            stroke = stroke,
            y = baseline,
            fs = style.font_size,
            family = escape_markup(&self.family),
            color = style.color,
            text = escape_markup(text),
        ))
    }
}

/// Whether `family` resolves to a face at regular weight and style.
fn resolves(db: &fontdb::Database, family: fontdb::Family<'_>) -> bool {
    let families = [family];
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    db.query(&query).is_some()
}

/// Family name of the first upright proportional face, or of any face.
fn fallback_family(db: &fontdb::Database) -> Option<String> {
    db.faces()
        .find(|face| face.style == fontdb::Style::Normal && !face.monospaced)
        .or_else(|| db.faces().next())
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone())
}

/// Split a CSS font-family list into fontdb families.
fn requested_families(list: &str) -> Vec<fontdb::Family<'_>> {
    list.split(',')
        .map(|name| name.trim().trim_matches(|c: char| c == '"' || c == '\''))
        .filter(|name| !name.is_empty())
        .map(|name| match name {
            "serif" => fontdb::Family::Serif,
            "sans-serif" => fontdb::Family::SansSerif,
            "monospace" => fontdb::Family::Monospace,
            "cursive" => fontdb::Family::Cursive,
            "fantasy" => fontdb::Family::Fantasy,
            other => fontdb::Family::Name(other),
        })
        .collect()
}

/// Escape the five XML-reserved characters.
pub fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Reject style values that would produce a broken or hostile description.
fn validate_style(style: &TextStyle) -> Result<()> {
    if !style.font_size.is_finite() || style.font_size <= 0.0 {
        return Err(FormfillError::Render(format!(
            "font size must be a positive finite number, got {}",
            style.font_size
        )));
    }
    if !style.padding.is_finite() || style.padding < 0.0 {
        return Err(FormfillError::Render(format!(
            "padding must be a non-negative finite number, got {}",
            style.padding
        )));
    }
    if style.box_width == 0 || style.box_height == 0 {
        return Err(FormfillError::Render(format!(
            "text box must be non-empty, got {}x{}",
            style.box_width, style.box_height
        )));
    }
    if !is_paint_token(&style.color) {
        return Err(FormfillError::Render(format!("invalid text colour {:?}", style.color)));
    }
    if let Some(outline) = &style.outline {
        if !is_paint_token(outline) {
            return Err(FormfillError::Render(format!("invalid outline colour {outline:?}")));
        }
    }
    Ok(())
}

/// Named colours, hex values, and functional notation such as `rgb(0, 0, 0)`.
fn is_paint_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' '))
}

/// Convert resvg's premultiplied pixmap into a straight-alpha RGBA image.
fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut tile = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in tile.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    tile
}
