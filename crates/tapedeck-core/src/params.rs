//! Parameter structures for tapedeck operations.
//!
//! These structures carry the inputs of the [`crate::handlers`] without any
//! interface-specific derives. Interface layers wrap them: the CLI defines
//! `clap::Args` structs and converts them with `From`.
//!
//! ```ignore
//! #[derive(Args)]
//! pub struct AddFolderArgs {
//!     pub name: String,
//!     #[arg(long, default_value_t = 0)]
//!     pub parent: u64,
//! }
//!
//! impl From<AddFolderArgs> for AddFolder {
//!     fn from(args: AddFolderArgs) -> Self {
//!         AddFolder { name: args.name, parent_key: args.parent }
//!     }
//! }
//! ```

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::models::DB_NO_KEY;

/// Generic parameters for operations requiring just an ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the node to operate on
    pub id: u64,
}

/// Parameters for adding a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFolder {
    /// Name of the folder
    pub name: String,
    /// Folder to add it to, or [`DB_NO_KEY`] for the top level
    #[serde(default)]
    pub parent_key: u64,
}

/// Parameters for listing the children of a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChildren {
    #[serde(default)]
    pub parent_key: u64,
}

impl Default for ListChildren {
    fn default() -> Self {
        Self {
            parent_key: DB_NO_KEY,
        }
    }
}

/// Parameters for finding nodes by name or creation time.
///
/// With neither set, every node matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindNodes {
    pub name: Option<String>,
    pub date: Option<Timestamp>,
}

/// Parameters for renaming a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameNode {
    pub id: u64,
    pub name: String,
}

/// Parameters for moving a node to another folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveNode {
    pub id: u64,
    /// New parent, or [`DB_NO_KEY`] for the top level
    pub parent_key: u64,
}

/// Parameters for removing a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveNode {
    pub id: u64,
    /// Also remove everything below the node and its recordings' chunks
    #[serde(default)]
    pub recursive: bool,
}

/// Parameters for importing raw 16-bit little-endian PCM as a recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecording {
    /// Name of the new item
    pub name: String,
    /// Folder to add the item to
    #[serde(default)]
    pub parent_key: u64,
    /// Samples per second
    pub sample_rate: u32,
}
