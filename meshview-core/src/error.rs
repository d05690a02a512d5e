//! Error types for meshview

use crate::scene::MeshId;
use thiserror::Error;

/// Main error type for meshview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Scalar array length {actual} does not match point count {expected}")]
    ScalarLengthMismatch { expected: usize, actual: usize },

    #[error("Point array length {actual} does not match mesh point count {expected}")]
    PointCountMismatch { expected: usize, actual: usize },

    #[error("No mesh with id {0} in the scene")]
    MeshNotFound(MeshId),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Session is closed")]
    SessionClosed,
}

/// Result type alias for meshview operations
pub type Result<T> = std::result::Result<T, Error>;
