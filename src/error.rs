//! Error types.
//!
//! - `EngineError`: the typed, recoverable failures of the correction, metrics
//!   and ranking engine.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Failures reported by the engine and its stores.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown country '{0}'")]
    UnknownCountry(String),

    #[error("invalid base curve for occupation '{code}': {reason}")]
    InvalidBaseCurve { code: String, reason: String },

    #[error("insufficient horizon: {start}+{window} exceeds the last modeled year {last}")]
    InsufficientHorizon { start: i32, window: i32, last: i32 },

    #[error("invalid limit {0}: top_n must be greater than zero")]
    InvalidLimit(usize),

    #[error("unknown occupation '{code}' in country '{country_id}'")]
    UnknownOccupation { code: String, country_id: String },

    #[error("profile validation failed for '{country_id}': {reason}")]
    ProfileValidationFailed { country_id: String, reason: String },

    #[error("year {year} is outside the modeled horizon {first}..={last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },

    #[error("occupation '{code}' appears more than once in country '{country_id}'")]
    DuplicateOccupation { code: String, country_id: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Process exit code used when this error reaches the binary.
    ///
    /// - 2: invalid input or configuration
    /// - 3: unknown entity
    /// - 4: computation could not be carried out
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::InvalidBaseCurve { .. }
            | EngineError::InvalidLimit(_)
            | EngineError::ProfileValidationFailed { .. }
            | EngineError::YearOutOfRange { .. }
            | EngineError::DuplicateOccupation { .. }
            | EngineError::InvalidConfig(_) => 2,
            EngineError::UnknownCountry(_) | EngineError::UnknownOccupation { .. } => 3,
            EngineError::InsufficientHorizon { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_exit_codes() {
        let err: AppError = EngineError::UnknownCountry("Atlantis".to_string()).into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("Atlantis"));

        let err: AppError = EngineError::InvalidLimit(0).into();
        assert_eq!(err.exit_code(), 2);
    }
}
