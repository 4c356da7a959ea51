//! Object-store engine over SQLite.
//!
//! This module provides the synchronous storage engine under the async
//! [`crate::LocalDb`] facade. A database is one SQLite file holding any
//! number of object stores. Each store is a table keyed by an integer
//! primary key with a single value column, and each store index is an
//! expression index over the JSON value. The database version lives in the
//! SQLite `user_version` pragma and is raised only inside a version-change
//! transaction (see [`migrations`]).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::Duration,
};

use log::{debug, info};
use rusqlite::{OpenFlags, TransactionBehavior};

use crate::error::{DatabaseResultExt, OpenError, Result, StoreError};

pub mod migrations;
pub mod store_queries;
pub mod utils;
pub mod value;

pub use migrations::{IndexDef, ObjectStoreBuilder, StoreDef, Upgrade, VersionChange};
pub use store_queries::{Record, StoreHandle};
pub use value::{IndexKey, Key, Value};

/// Default time a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(500);

/// Access mode of a store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

impl TransactionMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            TransactionMode::ReadOnly => TransactionBehavior::Deferred,
            TransactionMode::ReadWrite => TransactionBehavior::Immediate,
        }
    }
}

/// Where and how to open a database.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Path of the SQLite file
    pub path: PathBuf,
    /// Logical database name, used in diagnostics
    pub name: String,
    /// Requested schema version; must be at least 1
    pub version: u32,
    /// How long to wait on a database locked by another connection
    pub busy_timeout: Duration,
}

/// A live handle to one versioned database.
///
/// The SQLite connection is guarded by a mutex, so transactions issued
/// through the same `Connection` run one after another.
pub struct Connection {
    name: String,
    version: u32,
    path: PathBuf,
    stores: HashMap<String, StoreDef>,
    inner: Mutex<rusqlite::Connection>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Opens the database described by `config`, migrating it with `schema`
    /// when the on-disk version is older than the requested one.
    ///
    /// `on_migrate` is called once, before the upgrade callback runs, so the
    /// caller can observe the migration phase.
    pub fn open(
        config: &ConnectionConfig,
        schema: &dyn Upgrade,
        on_migrate: &dyn Fn(),
    ) -> std::result::Result<Self, OpenError> {
        let name = config.name.as_str();
        debug!("Opening database '{}' at {}", name, config.path.display());

        let mut connection = rusqlite::Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| OpenError::from_engine(name, &e))?;
        connection
            .busy_timeout(config.busy_timeout)
            .map_err(|e| OpenError::from_engine(name, &e))?;

        let found = migrations::user_version(&connection).map_err(|e| OpenError::from_engine(name, &e))?;
        if found > config.version {
            return Err(OpenError::Version {
                name: name.to_string(),
                requested: config.version,
                found,
            });
        }

        if found < config.version {
            on_migrate();
            info!(
                "Upgrading database '{}' from version {} to {}",
                name, found, config.version
            );
            let tx = connection
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| OpenError::from_engine(name, &e))?;
            migrations::ensure_catalog(&tx).map_err(|e| OpenError::from_engine(name, &e))?;
            {
                let change = VersionChange::new(&tx, found, config.version);
                schema.upgrade(&change)?;
            }
            migrations::set_user_version(&tx, config.version)
                .map_err(|e| OpenError::from_engine(name, &e))?;
            tx.commit().map_err(|e| OpenError::from_engine(name, &e))?;
        }

        let stores = migrations::load_catalog(&connection).map_err(|e| OpenError::from_engine(name, &e))?;
        debug!(
            "Database '{}' ready at version {} with {} store(s)",
            name,
            config.version,
            stores.len()
        );

        Ok(Self {
            name: config.name.clone(),
            version: config.version,
            path: config.path.clone(),
            stores,
            inner: Mutex::new(connection),
        })
    }

    /// Logical name of the database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version the database was opened at.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all object stores, sorted.
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Definition of the named store, if it exists.
    pub fn store(&self, name: &str) -> Option<&StoreDef> {
        self.stores.get(name)
    }

    /// Runs `f` against a handle on `store` inside a fresh transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`. The handle cannot outlive the call.
    pub fn transaction<T, F>(&self, store: &str, mode: TransactionMode, f: F) -> Result<T>
    where
        F: FnOnce(&StoreHandle<'_>) -> Result<T>,
    {
        let def = self
            .stores
            .get(store)
            .ok_or_else(|| StoreError::UnknownStore {
                store: store.to_string(),
            })?;

        let mut connection = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = connection
            .transaction_with_behavior(mode.behavior())
            .db_context("Failed to begin transaction")?;

        let value = f(&StoreHandle::new(&tx, def, mode))?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(value)
    }
}
