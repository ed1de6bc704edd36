// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formfill-render: Raster side of the form filler.
//
// Provides template loading, text tile rasterisation from escaped SVG,
// signature fitting, and the compositor that layers everything onto the
// template and flattens it to JPEG.

pub mod compose;
pub mod signature;
pub mod template;
pub mod text;

pub use compose::{CompositionResult, Compositor, Overlay};
pub use signature::SignatureNormalizer;
pub use template::TemplateDocument;
pub use text::TextRenderer;
