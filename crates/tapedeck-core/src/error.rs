//! Error types for the storage library.
//!
//! Errors raised while a connection is being opened are kept separate in
//! [`OpenError`] and [`SchemaError`]: an open attempt is shared by every
//! caller waiting on it, so those types are `Clone` and carry rendered
//! messages rather than engine error values.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Failure of a schema operation inside a version-change transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The object store is already recorded in the catalog
    #[error("Object store '{store}' already exists")]
    AlreadyExists { store: String },
    /// The index is already recorded for this store
    #[error("Index '{index}' already exists on object store '{store}'")]
    IndexAlreadyExists { store: String, index: String },
    /// Store, index or key path names are restricted to a safe alphabet
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
    /// Engine failure while creating schema objects
    #[error("Schema engine error: {message}")]
    Engine { message: String },
}

impl SchemaError {
    /// Whether this is one of the "already exists" conditions a migration
    /// may safely skip.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            SchemaError::AlreadyExists { .. } | SchemaError::IndexAlreadyExists { .. }
        )
    }

    pub(crate) fn engine(context: &str, source: &rusqlite::Error) -> Self {
        SchemaError::Engine {
            message: format!("{context}: {source}"),
        }
    }
}

/// Failure of an attempt to open a database.
///
/// Every variant is terminal for the attempt; nothing is cached and a later
/// call starts over.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// The engine refused to open the database file
    #[error("Cannot open database '{name}': {reason}")]
    Refused { name: String, reason: String },
    /// Another connection holds the database, so the version change cannot
    /// proceed
    #[error("Database '{name}' is blocked by another connection; close other sessions and retry")]
    Blocked { name: String },
    /// A migration step failed
    #[error("Cannot create store: {0}")]
    Schema(#[from] SchemaError),
    /// The file on disk was written by a newer schema
    #[error("Database '{name}' is at version {found}, newer than requested version {requested}")]
    Version {
        name: String,
        requested: u32,
        found: u32,
    },
}

impl OpenError {
    /// Classify an engine error raised while opening or migrating.
    pub(crate) fn from_engine(name: &str, source: &rusqlite::Error) -> Self {
        match source.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                OpenError::Blocked {
                    name: name.to_string(),
                }
            }
            _ => OpenError::Refused {
                name: name.to_string(),
                reason: source.to_string(),
            },
        }
    }
}

/// Comprehensive error type for all storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The connection could not be obtained
    #[error("Could not get connection: {0}")]
    Connection(#[from] OpenError),
    /// A read or write request failed inside its transaction
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// A write was rejected by a uniqueness constraint; the store is
    /// unchanged
    #[error("Constraint violated: {message}")]
    Constraint {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// No object store with this name exists in the database
    #[error("Object store '{store}' does not exist")]
    UnknownStore { store: String },
    /// A write primitive was issued through a read-only handle
    #[error("Object store '{store}' was opened read-only")]
    ReadOnly { store: String },
    /// A stored or supplied value does not have the expected shape
    #[error("Invalid data in object store '{store}': {reason}")]
    Data { store: String, reason: String },
    /// A chunk expected inside a recording's run is absent
    #[error("Chunk with key {id} not found")]
    MissingChunk { id: u64 },
    /// A multi-store clear stopped part way
    #[error("Cleared {cleared} of the stores before failing: {source}")]
    PartialClear {
        cleared: usize,
        #[source]
        source: Box<StoreError>,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing exported samples failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration and runtime errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    ///
    /// Constraint violations become [`StoreError::Constraint`] so callers can
    /// tell a rejected write from a failed one.
    pub fn with_source(self, source: rusqlite::Error) -> StoreError {
        if source.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            StoreError::Constraint {
                message: format!("{}: {}", self.message, source),
                source,
            }
        } else {
            StoreError::Database {
                message: self.message,
                source,
            }
        }
    }
}

impl StoreError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a data error for the given store.
    pub fn data(store: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Data {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Whether the write was rejected by a uniqueness constraint.
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint { .. })
    }

    /// Whether the database was blocked by another connection.
    pub fn is_blocked(&self) -> bool {
        matches!(self, StoreError::Connection(OpenError::Blocked { .. }))
    }

    pub(crate) fn join(error: tokio::task::JoinError) -> Self {
        StoreError::Configuration {
            message: format!("Task join error: {error}"),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| StoreError::database(message).with_source(e))
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
