//! Whole-database maintenance for LocalDb.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, info};
use tokio::task;

use super::LocalDb;
use crate::{
    db::TransactionMode,
    error::{Result, StoreError},
    schema::{DB_DATA_STORE_NAME, DB_TREE_STORE_NAME},
};

/// Suffixes of the files SQLite keeps next to a database.
const SIDE_FILE_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

impl LocalDb {
    /// Empties the data store, then the tree store; returns the number of
    /// stores cleared.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PartialClear` carrying the number of stores
    /// cleared before the failing one. Stores cleared before the failure stay
    /// cleared.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut cleared = 0;
        for store in [DB_DATA_STORE_NAME, DB_TREE_STORE_NAME] {
            match self
                .with_store(store, TransactionMode::ReadWrite, |handle| handle.clear())
                .await
            {
                Ok(removed) => {
                    debug!("Cleared {removed} record(s) from '{store}'");
                    cleared += 1;
                }
                Err(e) => {
                    return Err(StoreError::PartialClear {
                        cleared,
                        source: Box::new(e),
                    })
                }
            }
        }
        info!("Cleared {} store(s) in '{}'", cleared, self.name());
        Ok(cleared)
    }

    /// Closes the connection and deletes the database file.
    ///
    /// The next operation on this handle creates and migrates a fresh
    /// database.
    pub async fn delete_database(&self) -> Result<()> {
        self.close();
        delete_database(self.path()).await
    }
}

/// Deletes the database at `path` together with its SQLite side files.
///
/// Deleting a database that does not exist succeeds.
pub async fn delete_database(path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || remove_database_files(&path))
        .await
        .map_err(StoreError::join)?
}

fn remove_database_files(path: &Path) -> Result<()> {
    let mut removed = 0;
    for file in database_files(path) {
        match std::fs::remove_file(&file) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StoreError::FileSystem {
                    path: file,
                    source: e,
                })
            }
        }
    }
    info!("Deleted database at {} ({removed} file(s))", path.display());
    Ok(())
}

fn database_files(path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    files.extend(SIDE_FILE_SUFFIXES.iter().map(|suffix| {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }));
    files
}
