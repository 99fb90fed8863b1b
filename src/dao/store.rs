//! Whole-document JSON persistence for the game database.

use std::io::ErrorKind;

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::dao::models::GameRecord;

/// Sentinel destination meaning "never touch the filesystem". Used for tests
/// and ephemeral games.
pub const MEMORY_CONNECTION: &str = ":memory:";

/// Result alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised while reading or writing the backing document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The destination could not be read or written.
    #[error("failed to access game database at {path}")]
    Io {
        /// Destination that failed.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The destination held content that is not a valid game document.
    #[error("game database at {path} is not valid JSON")]
    Parse {
        /// Destination that failed.
        path: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// The persistence store: one serialized document holding every game record,
/// cached in memory after the first load for the lifetime of the process.
#[derive(Debug)]
pub struct JsonStore {
    connection: String,
    cache: Option<Vec<GameRecord>>,
}

impl JsonStore {
    /// Create a store backed by `connection` — a filesystem path, or
    /// [`MEMORY_CONNECTION`] for an ephemeral store.
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            cache: None,
        }
    }

    /// The configured backing destination.
    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Return the cached document, reading and parsing the backing destination
    /// on first access. A missing or empty destination yields the empty
    /// document rather than an error.
    pub async fn load(&mut self) -> StorageResult<&mut Vec<GameRecord>> {
        if self.cache.is_none() {
            let records = match fs::read_to_string(&self.connection).await {
                Ok(contents) if contents.trim().is_empty() => Vec::new(),
                Ok(contents) => {
                    serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
                        path: self.connection.clone(),
                        source,
                    })?
                }
                Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
                Err(source) => {
                    return Err(StorageError::Io {
                        path: self.connection.clone(),
                        source,
                    });
                }
            };
            debug!(
                path = %self.connection,
                games = records.len(),
                "loaded game database"
            );
            self.cache = Some(records);
        }

        Ok(self.cache.get_or_insert_with(Vec::new))
    }

    /// Serialize the cached document to the backing destination, pretty-printed
    /// for human diffing. Skipped entirely for the in-memory sentinel. Returns
    /// the store itself so callers can chain.
    pub async fn save(&mut self) -> StorageResult<&mut Self> {
        if self.connection == MEMORY_CONNECTION {
            return Ok(self);
        }

        let records = self.cache.get_or_insert_with(Vec::new);
        let body = serde_json::to_string_pretty(records).map_err(|source| StorageError::Parse {
            path: self.connection.clone(),
            source,
        })?;

        fs::write(&self.connection, body)
            .await
            .map_err(|source| StorageError::Io {
                path: self.connection.clone(),
                source,
            })?;

        Ok(self)
    }
}
