//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - validated inputs (`OccupationRecord`, `DiffusionProfile`)
//! - derived outputs (`CorrectedCurve`, `MetricBundle`, `ComparisonResult`)
//! - configuration (`MetricsConfig`, `CorrectionConfig`, `EngineConfig`, `RunConfig`)
//! - horizon helpers (`FIRST_YEAR`, `LAST_YEAR`, `year_index`)

pub mod types;

pub use types::*;
