// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formfill-forms: Form tables and the fill pipeline.
//
// Holds the declarative template definitions (Form 60 built in), the field
// mapper that validates and transforms form data, the template registry, and
// the `FormFiller` that drives mapping, rendering, and compositing.

pub mod definition;
pub mod engine;
pub mod mapper;
pub mod registry;

pub use definition::{FieldPlacement, FieldSpec, SignatureSlot, TemplateDefinition, Transform};
pub use engine::FormFiller;
pub use mapper::{FieldMapper, MappedForm};
pub use registry::{RegisteredTemplate, TemplateRegistry};
