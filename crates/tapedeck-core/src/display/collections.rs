//! Collection wrapper types for displaying groups of tree nodes.

use std::{fmt, ops::Index};

use crate::models::TreeNode;

/// Newtype wrapper for displaying a list of tree nodes.
///
/// # Examples
///
/// ```rust
/// use tapedeck_core::{display::Nodes, models::NewTreeNode, DB_NO_KEY};
///
/// let nodes = Nodes(vec![NewTreeNode::folder("Folder A", DB_NO_KEY).into_node(1)]);
/// assert!(nodes.to_string().contains("Folder A"));
/// assert_eq!(Nodes(vec![]).to_string(), "No nodes found.\n");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Nodes(pub Vec<TreeNode>);

impl Nodes {
    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of nodes in the collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get an iterator over the nodes.
    pub fn iter(&self) -> std::slice::Iter<'_, TreeNode> {
        self.0.iter()
    }
}

impl From<Vec<TreeNode>> for Nodes {
    fn from(nodes: Vec<TreeNode>) -> Self {
        Self(nodes)
    }
}

impl Index<usize> for Nodes {
    type Output = TreeNode;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for Nodes {
    type Item = TreeNode;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Nodes {
    type Item = &'a TreeNode;
    type IntoIter = std::slice::Iter<'a, TreeNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Nodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No nodes found.");
        }
        for node in &self.0 {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}
