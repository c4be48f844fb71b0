//! Error types for pagesense operations.
//!
//! This module defines the main error type [`PagesenseError`] which represents
//! the failures that can surface from fetching, parsing and embedding. Most of
//! the engine degrades instead of failing: extraction falls back to the document
//! body and the stability monitor never raises, so these errors mostly reach the
//! host through fetching and through the [`Embedder`](crate::embed::Embedder) seam.
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::{PagesenseError, Result};
//!
//! fn require_text(text: &str) -> Result<&str> {
//!     if text.trim().is_empty() {
//!         return Err(PagesenseError::EmptyInput);
//!     }
//!     Ok(text)
//! }
//! # assert!(require_text("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pagesense operations.
#[derive(Error, Debug)]
pub enum PagesenseError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures and connection issues from page
    /// fetching and from remote embedding endpoints.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedder was asked for inference before `init` completed.
    #[error("Embedder '{model}' is not initialized")]
    EmbedderNotInitialized { model: String },

    /// Embedding inference failed or returned a malformed response.
    ///
    /// These are not retried: the same input is expected to fail the same way.
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Two vectors that must share a dimensionality do not.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Report serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Empty text was passed where content is required.
    #[error("Input text is empty")]
    EmptyInput,
}

/// Result type alias for PagesenseError.
pub type Result<T> = std::result::Result<T, PagesenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PagesenseError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_dimension_mismatch_error() {
        let err = PagesenseError::DimensionMismatch { expected: 384, actual: 3 };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_not_initialized_error() {
        let err = PagesenseError::EmbedderNotInitialized { model: "hashing-384".to_string() };
        assert!(err.to_string().contains("hashing-384"));
    }

    #[test]
    fn test_timeout_error() {
        let err = PagesenseError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
