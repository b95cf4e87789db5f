//! Error types for the waymo-ap-eval library.

use thiserror::Error;

/// Result type for waymo-ap-eval operations.
pub type Result<T> = std::result::Result<T, WaymoEvalError>;

/// Error types that can occur while configuring or running the AP metric.
#[derive(Error, Debug)]
pub enum WaymoEvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid metric configuration (e.g. fewer than two PR points).
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Breakdown name that does not resolve to a known generator.
    #[error("Unknown breakdown: {0}")]
    UnknownBreakdown(String),

    /// Class name that is not part of the metadata.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Class id outside `1..num_classes`.
    #[error("Invalid class id {class_id}: expected 0 < class_id < {num_classes}")]
    InvalidClassId { class_id: usize, num_classes: usize },

    /// Parallel arrays or matcher outputs with inconsistent shapes.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid bounding box or score in loaded box data.
    #[error("Invalid box: {0}")]
    InvalidBox(String),

    /// Failure reported by the detection matcher.
    #[error("Matcher error: {0}")]
    Matcher(String),

    /// Evaluation was triggered while a previous pass never completed.
    #[error("Evaluation already in progress")]
    EvaluationInProgress,
}
