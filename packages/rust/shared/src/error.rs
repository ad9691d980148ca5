//! Error types for topicscrape.
//!
//! Library crates use [`TopicScrapeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all topicscrape operations.
#[derive(Debug, thiserror::Error)]
pub enum TopicScrapeError {
    /// Transport failure or non-success HTTP status while fetching a page.
    #[error("fetch error: {url}: {message}")]
    Fetch { url: String, message: String },

    /// A count string that is not a plain or `k`-abbreviated number.
    #[error("format error: {input:?}: {message}")]
    Format { input: String, message: String },

    /// Page structure did not match what the extractors expect.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, bad output format name, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TopicScrapeError>;

impl TopicScrapeError {
    /// Create a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a format error for the offending `input`.
    pub fn format(input: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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
