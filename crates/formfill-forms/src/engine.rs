// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fill pipeline: Mapper, text tiles, signature, compositor.

use std::sync::Arc;
use std::time::Instant;

use formfill_core::clock::Clock;
use formfill_core::config::EngineConfig;
use formfill_core::error::{CompositionStage, Result};
use formfill_core::types::CompositionRequest;
use formfill_render::{CompositionResult, Compositor, Overlay, SignatureNormalizer, TextRenderer};
use tracing::{Span, debug, info, info_span};

use crate::mapper::FieldMapper;
use crate::registry::TemplateRegistry;

/// Fills registered templates. Immutable after construction; share it
/// between workers behind an `Arc`.
pub struct FormFiller {
    registry: TemplateRegistry,
    mapper: FieldMapper,
    renderer: TextRenderer,
    compositor: Compositor,
    clock: Arc<dyn Clock>,
    /// Parent of every per-request span.
    span: Span,
}

impl FormFiller {
    /// Build the pipeline from configuration. Loads fonts once.
    pub fn new(registry: TemplateRegistry, config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            mapper: FieldMapper::from_config(config)?,
            renderer: TextRenderer::new(&config.fonts)?,
            compositor: Compositor::from_config(config),
            clock,
            span: Span::current(),
        })
    }

    /// Attach request spans under `span` instead of the span active at
    /// construction.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Run one request end to end. All-or-nothing: either a complete image or
    /// an error.
    pub fn fill(&self, request: &CompositionRequest) -> Result<CompositionResult> {
        let span = info_span!(
            parent: &self.span,
            "fill",
            request_id = %request.request_id,
            template = %request.template_id
        );
        let _enter = span.enter();
        let started = Instant::now();

        let template = self.registry.get(&request.template_id)?;
        let mapped = self
            .mapper
            .map(template.definition(), request, self.clock.now())?;

        let mut overlays = Vec::with_capacity(mapped.elements.len() + 1);
        for element in &mapped.elements {
            let tile = self
                .renderer
                .render_element(element)
                .map_err(|err| err.in_stage(CompositionStage::TextOverlay))?;
            overlays.push(Overlay::new(element.source.clone(), tile, element.anchor));
        }

        if let Some(signature) = &mapped.signature {
            let tile = SignatureNormalizer::normalize(
                &signature.image_bytes,
                signature.target.width,
                signature.target.height,
            )
            .map_err(|err| err.in_stage(CompositionStage::Signature))?;
            debug!(width = tile.width(), height = tile.height(), "Signature placed");
            overlays.push(Overlay::new("signature", tile, signature.anchor));
        }

        let result = self
            .compositor
            .compose(template.document(), &overlays)
            .map_err(|err| err.in_stage(CompositionStage::Layering))?;

        info!(
            overlays = overlays.len(),
            bytes = result.as_bytes().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Form filled"
        );
        Ok(result)
    }

    /// Fill and return the base64 string handed back to HTTP callers.
    pub fn fill_base64(&self, request: &CompositionRequest) -> Result<String> {
        self.fill(request).map(|result| result.to_base64())
    }
}
