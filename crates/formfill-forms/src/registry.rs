// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template registry: Form id to base image and field table.
//
// Built once before serving; afterwards it is only read, so it can be shared
// across worker threads without locking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use formfill_core::config::EngineConfig;
use formfill_core::error::{FormfillError, Result};
use formfill_render::TemplateDocument;
use tracing::{debug, info, instrument, warn};

use crate::definition::TemplateDefinition;

/// A validated table together with its loaded image.
#[derive(Debug, Clone)]
pub struct RegisteredTemplate {
    definition: TemplateDefinition,
    document: Arc<TemplateDocument>,
}

impl RegisteredTemplate {
    pub fn definition(&self) -> &TemplateDefinition {
        &self.definition
    }

    pub fn document(&self) -> &Arc<TemplateDocument> {
        &self.document
    }
}

/// All fillable forms known to the process.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    /// Keyed by lower-cased template id.
    templates: BTreeMap<String, RegisteredTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every definition in `config.template_dir`, then fall back to the
    /// built-in Form 60 table if the directory holds its image but no
    /// definition for it.
    #[instrument(skip_all, fields(dir = %config.template_dir.display()))]
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut registry = Self::new();
        let dir = &config.template_dir;
        if dir.is_dir() {
            registry.load_dir(dir)?;
        } else {
            warn!("Template directory does not exist");
        }

        let builtin = TemplateDefinition::form60()?;
        if !registry.contains(&builtin.id) {
            let image = dir.join(&builtin.image);
            if image.is_file() {
                let document = TemplateDocument::open(&builtin.id, &image)?;
                registry.register(builtin, Arc::new(document))?;
            } else {
                warn!(image = %image.display(), "Form 60 image not found; built-in template disabled");
            }
        }

        info!(templates = registry.len(), "Template registry ready");
        Ok(registry)
    }

    /// Register every `*.json` definition in `dir`. Images are resolved
    /// relative to `dir`. Returns the number of templates added.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        // Directory order is platform-dependent.
        paths.sort();

        for path in &paths {
            let raw = std::fs::read_to_string(path)?;
            let definition = TemplateDefinition::from_json(&raw).map_err(|err| {
                FormfillError::TemplateConfig(format!("{}: {}", path.display(), err))
            })?;
            let document = TemplateDocument::open(&definition.id, dir.join(&definition.image))?;
            debug!(definition = %path.display(), id = %definition.id, "Template definition read");
            self.register(definition, Arc::new(document))?;
        }
        Ok(paths.len())
    }

    /// Validate `definition` against `document` and add it.
    pub fn register(&mut self, definition: TemplateDefinition, document: Arc<TemplateDocument>) -> Result<()> {
        definition.validate(document.size())?;

        let key = definition.id.to_lowercase();
        if self.templates.contains_key(&key) {
            return Err(FormfillError::TemplateConfig(format!(
                "template '{}' registered twice",
                definition.id
            )));
        }
        info!(
            id = %definition.id,
            placements = definition.placements.len(),
            width = document.width(),
            height = document.height(),
            "Template registered"
        );
        self.templates.insert(key, RegisteredTemplate { definition, document });
        Ok(())
    }

    /// Look up a template by id, ignoring case.
    pub fn get(&self, id: &str) -> Result<&RegisteredTemplate> {
        self.templates
            .get(&id.to_lowercase())
            .ok_or_else(|| FormfillError::UnknownTemplate(id.to_owned()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(&id.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
