//! Error types for CourseCraft.
//!
//! Library crates use [`CourseCraftError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::DocumentFormat;

/// Top-level error type for all CourseCraft operations.
///
/// Every variant is local to one user action; none of them is fatal to the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum CourseCraftError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error that happened outside a specific client call
    /// (e.g. building the HTTP client).
    #[error("transport error: {0}")]
    Transport(String),

    /// Completion endpoint failure: unreachable, non-2xx (auth included),
    /// or an unusable payload.
    #[error("generation error: {0}")]
    Generation(String),

    /// Search endpoint failure.
    #[error("search error: {0}")]
    Search(String),

    /// Generated text does not have the expected CSV or slide shape.
    #[error("format error: {message}")]
    Format { message: String },

    /// A document renderer rejected its input.
    #[error("{format} render error: {message}")]
    Render {
        format: DocumentFormat,
        message: String,
    },

    /// Archive construction failed.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad archive, wrong format for content, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseCraftError>;

impl CourseCraftError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a format error from any displayable message.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format {
            message: msg.into(),
        }
    }

    /// Create a render error for the given renderer.
    pub fn render(format: DocumentFormat, msg: impl Into<String>) -> Self {
        Self::Render {
            format,
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
