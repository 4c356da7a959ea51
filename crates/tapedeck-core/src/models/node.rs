//! Tree node model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::RecordingInfo;

/// Parent key of nodes that sit at the top of the hierarchy.
pub const DB_NO_KEY: u64 = 0;

/// A folder or leaf item in the tree store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Unique identifier assigned by the store
    pub id: u64,

    /// Display name; not unique, even among siblings
    pub name: String,

    /// ID of the parent node, or [`DB_NO_KEY`] for top-level nodes
    pub parent_key: u64,

    /// Creation timestamp; unique across all nodes
    pub date: Timestamp,

    /// Recording owned by a leaf item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<RecordingInfo>,
}

impl TreeNode {
    /// Whether the node has no parent.
    pub fn is_top_level(&self) -> bool {
        self.parent_key == DB_NO_KEY
    }

    /// Whether the node is a leaf carrying a recording.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }
}

/// A tree node that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTreeNode {
    pub name: String,
    pub parent_key: u64,
    pub date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<RecordingInfo>,
}

impl NewTreeNode {
    /// A folder under `parent_key`, dated now.
    pub fn folder(name: impl Into<String>, parent_key: u64) -> Self {
        Self {
            name: name.into(),
            parent_key,
            date: Timestamp::now(),
            recording: None,
        }
    }

    /// A leaf item owning `recording`, dated now.
    pub fn recording(name: impl Into<String>, parent_key: u64, recording: RecordingInfo) -> Self {
        Self {
            name: name.into(),
            parent_key,
            date: Timestamp::now(),
            recording: Some(recording),
        }
    }

    /// Replaces the creation timestamp.
    pub fn with_date(mut self, date: Timestamp) -> Self {
        self.date = date;
        self
    }

    /// The stored node once the store has assigned `id`.
    pub fn into_node(self, id: u64) -> TreeNode {
        TreeNode {
            id,
            name: self.name,
            parent_key: self.parent_key,
            date: self.date,
            recording: self.recording,
        }
    }
}
