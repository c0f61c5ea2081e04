//! Error types for tagscout.
//!
//! The search engine itself never fails: an absent root, a missing name and a
//! cancelled search all resolve to [`crate::search::SearchOutcome::NotFound`].
//! The errors below cover everything around it: reading and parsing trees,
//! loading configuration, binding the HTTP server and validating arguments.
//!
//! ```rust,ignore
//! match load_tree(path) {
//!     Ok(root) => // search it,
//!     Err(TagScoutError::TreeNotFound(path)) => // point the user at the path,
//!     Err(TagScoutError::JsonError(e)) => // report the malformed document,
//!     Err(e) => // everything else
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type for tagscout operations
pub type TagScoutResult<T> = Result<T, TagScoutError>;

/// Errors that can occur outside the search engine
#[derive(Error, Debug)]
pub enum TagScoutError {
    #[error("Tree file not found: {0}")]
    TreeNotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TagScoutError {
    pub fn tree_not_found(path: impl Into<PathBuf>) -> Self {
        Self::TreeNotFound(path.into())
    }

    pub fn invalid_address(addr: impl Into<String>) -> Self {
        Self::InvalidAddress(addr.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
