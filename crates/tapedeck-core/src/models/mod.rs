//! Data models for the tree store and recordings.
//!
//! [`TreeNode`] is the record type of the tree store: folders and the leaf
//! items that own recordings. [`RecordingInfo`] ties a leaf item to the run
//! of chunks in the data store that hold its samples. Display
//! implementations live in [`crate::display`].

pub mod node;
pub mod recording;


pub use node::{NewTreeNode, TreeNode, DB_NO_KEY};
pub use recording::{
    bytes_to_samples, chunk_count, samples_to_bytes, RecordingInfo, BYTES_PER_SAMPLE,
    DB_CHUNK_LENGTH,
};
