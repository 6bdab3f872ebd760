//! Error types for graph loading.

use thiserror::Error;

/// Errors raised by statement sources and RDF parsing.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The storage collaborator failed to answer a bulk load.
    #[error("Failed to load statements: {message}")]
    Load { message: String },

    /// RDF input could not be parsed.
    #[error("Failed to parse RDF: {message}")]
    Parse { message: String },

    /// The RDF serialization could not be determined.
    #[error("Unsupported RDF format: {format}")]
    UnsupportedFormat { format: String },

    /// I/O error (e.g., reading a data file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
