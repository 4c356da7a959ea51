//! Builder for creating and configuring LocalDb instances.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use log::debug;

use super::LocalDb;
use crate::{
    connection::ConnectionManager,
    db::{ConnectionConfig, Upgrade, DEFAULT_BUSY_TIMEOUT},
    error::{Result, StoreError},
    schema::{RecorderSchema, DB_NAME, DB_VERSION},
};

/// Builder for creating and configuring LocalDb instances.
#[derive(Clone)]
pub struct LocalDbBuilder {
    database_path: Option<PathBuf>,
    name: String,
    version: u32,
    busy_timeout: Duration,
    schema: Arc<dyn Upgrade>,
}

impl fmt::Debug for LocalDbBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalDbBuilder")
            .field("database_path", &self.database_path)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("busy_timeout", &self.busy_timeout)
            .finish_non_exhaustive()
    }
}

impl LocalDbBuilder {
    /// Creates a new builder for the recorder database at its current
    /// schema version.
    pub fn new() -> Self {
        Self {
            database_path: None,
            name: DB_NAME.to_string(),
            version: DB_VERSION,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            schema: Arc::new(RecorderSchema),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/tapedeck/<name>.db` or
    /// `~/.local/share/tapedeck/<name>.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the logical database name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the requested schema version. Opening a database stored at a
    /// lower version runs the schema upgrade.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets how long an open waits on a database locked by another
    /// connection before failing as blocked.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Replaces the schema upgrade run on version increases.
    pub fn with_schema(mut self, schema: Arc<dyn Upgrade>) -> Self {
        self.schema = schema;
        self
    }

    /// Builds the configured database handle.
    ///
    /// The database itself is opened lazily by the first operation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the name or version is invalid
    /// Returns `StoreError::XdgDirectory` if no default path can be found
    /// Returns `StoreError::FileSystem` if the parent directory cannot be
    /// created
    pub fn build(self) -> Result<LocalDb> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Configuration {
                message: "Database name must not be empty".to_string(),
            });
        }
        if self.version == 0 {
            return Err(StoreError::Configuration {
                message: "Database version must be at least 1".to_string(),
            });
        }

        let path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path(&self.name)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        debug!(
            "Configured database '{}' v{} at {}",
            self.name,
            self.version,
            path.display()
        );

        let config = ConnectionConfig {
            path,
            name: self.name,
            version: self.version,
            busy_timeout: self.busy_timeout,
        };
        Ok(LocalDb::new(ConnectionManager::new(config, self.schema)))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    pub fn default_database_path(name: &str) -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("tapedeck")
            .place_data_file(format!("{name}.db"))
            .map_err(|e| StoreError::XdgDirectory(e.to_string()))
    }
}

impl Default for LocalDbBuilder {
    fn default() -> Self {
        Self::new()
    }
}
