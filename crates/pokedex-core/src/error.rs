//! Error types for the Pokedex core.
//!
//! Errors fall into three families: transport (anything that went wrong
//! talking to the remote catalog, including malformed responses), storage
//! (durable store read or write), and caller mistakes such as out-of-range
//! indices.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the Pokedex core.
#[derive(Debug, Error)]
pub enum PokedexError {
    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Failed to fetch page at offset {offset} after {attempts} attempts: {message}")]
    PageFetchFailed {
        offset: u32,
        attempts: u32,
        message: String,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Storage errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    // Caller errors
    #[error("Index {index} out of range for collection of length {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Pokedex operations.
pub type Result<T> = std::result::Result<T, PokedexError>;

impl From<std::io::Error> for PokedexError {
    fn from(err: std::io::Error) -> Self {
        PokedexError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PokedexError {
    fn from(err: serde_json::Error) -> Self {
        PokedexError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl PokedexError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PokedexError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            PokedexError::Network { .. }
            | PokedexError::Timeout(_)
            | PokedexError::RateLimited { .. } => true,
            PokedexError::HttpStatus { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Whether the error came from talking to the remote catalog.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PokedexError::Network { .. }
                | PokedexError::Timeout(_)
                | PokedexError::RateLimited { .. }
                | PokedexError::HttpStatus { .. }
                | PokedexError::Validation { .. }
                | PokedexError::PageFetchFailed { .. }
        )
    }

    /// Whether the error came from the durable store.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            PokedexError::Storage { .. } | PokedexError::Io { .. } | PokedexError::Json { .. }
        )
    }
}
