//! Engine config file.
//!
//! ```json
//! { "metrics": { "lowMediumBoundary": 0.2, "mediumHighBoundary": 0.5,
//!                "rapidGapYears": 10, "moderateGapYears": 30 },
//!   "correction": { "shape": "power" } }
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use std::fs::File;
use std::path::Path;

use crate::domain::EngineConfig;
use crate::error::AppError;

/// Read and validate an engine config file.
pub fn read_engine_config(path: &Path) -> Result<EngineConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
    let config: EngineConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid config JSON '{}': {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}
