//! Error types for the library layer.

use std::fmt;
use std::path::PathBuf;

use crate::db::DbError;

/// Errors produced by a retailer or cashback store.
#[derive(Debug)]
pub enum StoreError {
    /// The SQLite store failed.
    Db(DbError),
    /// An alias merge targeted a retailer that does not exist.
    NotFound(String),
    /// The backing store could not be reached.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Db(e) => write!(f, "database error: {}", e),
            Self::NotFound(id) => write!(f, "retailer {} not found", id),
            Self::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}

/// Errors loading or validating site definitions.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse site config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid site config: {0}")]
    Invalid(String),
    #[error("unknown site {0}")]
    UnknownSite(String),
}
