use thiserror::Error;

/// Errors surfaced by the prediction core.
///
/// Only input validation and the one-time configuration load reach a caller
/// as `Err`. Synthesis and model failures stay behind their own error types
/// and degrade to defaults or the heuristic.
#[derive(Error, Debug)]
pub enum EmberError {
    #[error("invalid coordinate ({lat}, {lng}): {reason}")]
    InvalidCoordinate {
        lat: f64,
        lng: f64,
        reason: &'static str,
    },
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("invalid date {0:?}: expected ISO-8601 (YYYY-MM-DD or full timestamp)")]
    InvalidDate(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EmberError>;

/// Arithmetic failure while deriving a baseline feature.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("{feature} evaluated to a non-finite value ({value})")]
    NonFinite { feature: &'static str, value: f64 },
}

/// Failures while loading, training or evaluating a classifier.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },
    #[error("classifier produced a non-finite output ({0})")]
    NonFinite(f64),
    #[error("placeholder training failed: {0}")]
    Training(String),
    #[error("artifact IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact parse error: {0}")]
    Json(#[from] serde_json::Error),
}
