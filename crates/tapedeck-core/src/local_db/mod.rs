//! Async storage API for the recorder.
//!
//! [`LocalDb`] is the entry point applications use. It owns a
//! [`ConnectionManager`] that opens the database on first use, and exposes
//! the tree store, the data store and whole-database maintenance as async
//! methods. Every call runs in its own transaction on a blocking thread.
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for [`LocalDb`] instances with configuration
//! - [`tree_ops`]: Folder and item operations on the tree store
//! - [`data_ops`]: Chunk operations on the data store
//! - [`maintenance`]: Clearing and deleting the whole database
//!
//! # Usage
//!
//! ```rust,no_run
//! use tapedeck_core::{LocalDbBuilder, NewTreeNode, DB_NO_KEY};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = LocalDbBuilder::new()
//!     .with_database_path(Some("/tmp/tapedeck.db"))
//!     .build()?;
//!
//! let folder = db.add_node(&NewTreeNode::folder("Folder A", DB_NO_KEY)).await?;
//! let chunk = db.append_chunk(vec![0u8; 64]).await?;
//! let children = db.query_by_parent(folder).await?;
//! # Ok(())
//! # }
//! ```

use std::{path::Path, sync::Arc};

use tokio::task;

use crate::{
    connection::{ConnectionManager, ConnectionState},
    db::{Connection, StoreHandle, TransactionMode},
    error::{Result, StoreError},
    schema::{DB_DATA_STORE_NAME, DB_TREE_STORE_NAME},
};

pub mod builder;
pub mod data_ops;
pub mod maintenance;
pub mod tree_ops;

#[cfg(test)]
mod tests;

pub use builder::LocalDbBuilder;
pub use data_ops::ChunkRun;
pub use maintenance::delete_database;

/// Handle on the recorder database.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Debug, Clone)]
pub struct LocalDb {
    manager: Arc<ConnectionManager>,
}

impl LocalDb {
    pub(crate) fn new(manager: ConnectionManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        self.manager.path()
    }

    /// Logical name of the database.
    pub fn name(&self) -> &str {
        &self.manager.config().name
    }

    /// Lifecycle state of the underlying connection.
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Number of physical opens performed so far.
    pub fn open_count(&self) -> usize {
        self.manager.open_count()
    }

    /// Returns the open connection, opening and migrating the database if
    /// needed.
    pub async fn connection(&self) -> Result<Arc<Connection>> {
        Ok(self.manager.open().await?)
    }

    /// Runs `op` against `store` in a fresh transaction of the given mode.
    ///
    /// The transaction commits when `op` returns `Ok` and rolls back
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the database cannot be opened and
    /// `StoreError::UnknownStore` if `store` does not exist.
    pub async fn with_store<T, F>(&self, store: &str, mode: TransactionMode, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&StoreHandle<'_>) -> Result<T> + Send + 'static,
    {
        let connection = self.connection().await?;
        let store = store.to_string();

        task::spawn_blocking(move || connection.transaction(&store, mode, op))
            .await
            .map_err(StoreError::join)?
    }

    /// [`LocalDb::with_store`] on the tree store.
    pub async fn tree_store<T, F>(&self, mode: TransactionMode, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&StoreHandle<'_>) -> Result<T> + Send + 'static,
    {
        self.with_store(DB_TREE_STORE_NAME, mode, op).await
    }

    /// [`LocalDb::with_store`] on the data store.
    pub async fn data_store<T, F>(&self, mode: TransactionMode, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&StoreHandle<'_>) -> Result<T> + Send + 'static,
    {
        self.with_store(DB_DATA_STORE_NAME, mode, op).await
    }

    pub(crate) fn close(&self) -> bool {
        self.manager.close()
    }
}
