//! Engine errors
//!
//! All validation happens before a simulation starts; the tick loop itself
//! cannot fail. A settlement failure is fatal for the round, never retried
//! under a different seed.

use thiserror::Error;

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors rejected at the engine boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("race field is empty")]
    EmptyField,

    #[error("runner '{id}': attribute '{attribute}' out of range: {value}")]
    InvalidAttribute {
        id: String,
        attribute: &'static str,
        value: f64,
    },

    #[error("invalid track: {reason}")]
    InvalidTrack { reason: String },

    #[error("invalid race options: {reason}")]
    InvalidOptions { reason: String },

    #[error("invalid odds config: {reason}")]
    InvalidOddsConfig { reason: String },

    #[error("settlement seed does not match committed round (expected sub-seed {expected}, got {got})")]
    SeedMismatch { expected: u64, got: u64 },
}
