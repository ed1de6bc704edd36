// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formfill: Core types, configuration, clocks, and error definitions shared
// across all crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::FormfillError;
pub use types::*;
