//! Chunked persistent storage for the tapedeck audio recorder.
//!
//! Recordings are stored as a hierarchy of folders and items (the tree
//! store) plus a flat sequence of fixed-size binary chunks of samples (the
//! data store). Both live in one versioned SQLite database that is opened
//! lazily, migrated on version increases and shared by every operation.
//!
//! # Layers
//!
//! - [`db`]: Synchronous object-store engine over SQLite
//! - [`connection`]: Lazily opened, shared connection
//! - [`local_db`]: Async tree, data and maintenance operations
//! - [`recording`]: Streaming samples into and out of chunk runs
//! - [`operations`] and [`handlers`]: Multi-step workflows for interfaces
//! - [`display`]: Markdown formatting of results
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tapedeck_core::{operations::add_recording_node, LocalDbBuilder, NewTreeNode, DB_NO_KEY};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = LocalDbBuilder::new()
//!     .with_database_path(Some("recordings.db"))
//!     .build()?;
//!
//! let folder = db.add_node(&NewTreeNode::folder("Folder A", DB_NO_KEY)).await?;
//! let song = add_recording_node(&db, "Song 1", folder, 44100, &[0, 1, 2, 3]).await?;
//!
//! for child in db.query_by_parent(folder).await? {
//!     println!("{child}");
//! }
//! if let Some(recording) = &song.recording {
//!     let samples = db.recording_samples(recording).await?;
//!     assert_eq!(samples, vec![0, 1, 2, 3]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod db;
pub mod display;
pub mod error;
pub mod handlers;
pub mod local_db;
pub mod models;
pub mod operations;
pub mod params;
pub mod recording;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionManager, ConnectionState};
pub use db::TransactionMode;
pub use display::{CreateResult, DatabaseStatus, DeleteResult, Nodes, OperationStatus, UpdateResult};
pub use error::{OpenError, Result, SchemaError, StoreError};
pub use local_db::{delete_database, ChunkRun, LocalDb, LocalDbBuilder};
pub use models::{NewTreeNode, RecordingInfo, TreeNode, DB_CHUNK_LENGTH, DB_NO_KEY};
pub use recording::RecordingWriter;
pub use schema::{DB_DATA_STORE_NAME, DB_NAME, DB_TREE_STORE_NAME, DB_VERSION};
