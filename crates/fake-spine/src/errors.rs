//! Error types for the fake spine.

use thiserror::Error;

/// A matcher could not evaluate a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
    /// The request body is not well-formed XML.
    #[error("Malformed XML body: {0}")]
    MalformedXml(String),

    /// Any other matcher-specific failure.
    #[error("Matcher failed: {0}")]
    Failed(String),
}

/// Fake spine errors.
#[derive(Debug, Error)]
pub enum SpineError {
    /// No registered matcher accepted the request.
    #[error("No response configured matching the request")]
    NoMatchingResponse,

    /// The listener could not be bound or the server stopped.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
