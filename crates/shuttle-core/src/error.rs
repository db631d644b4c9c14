//! Errors for structurally invalid input.
//!
//! Runtime gaps (missing segment configs, unknown actors) are recovered
//! inside the engine and never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RallyError {
    #[error("a rally needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("rally point {index} has a non-finite coordinate")]
    NonFinitePoint { index: usize },

    #[error("segment {index} has an invalid speed {speed}")]
    InvalidSpeed { index: usize, speed: f64 },

    #[error("segment {index} has an invalid arc height {arc_height}")]
    InvalidArcHeight { index: usize, arc_height: f64 },

    #[error("invalid rally JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read rally file: {0}")]
    Io(#[from] std::io::Error),
}
