//! # Error Types
//!
//! Custom error types for Flight Record using `thiserror`.

use thiserror::Error;

/// Main error type for Flight Record
#[derive(Debug, Error)]
pub enum FlightRecordError {
    /// A known frame kind carried a body shorter than its fixed layout
    #[error(
        "frame type {frame_type} at offset {offset}: body is {actual} bytes, layout needs {expected}"
    )]
    ShortBody {
        frame_type: u8,
        offset: usize,
        expected: usize,
        actual: usize,
    },

    /// Strict decoding stopped before the end of the buffer
    #[error("decoding halted at offset {offset} with {remaining} unconsumed bytes")]
    TrailingBytes { offset: usize, remaining: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for Flight Record
pub type Result<T> = std::result::Result<T, FlightRecordError>;
