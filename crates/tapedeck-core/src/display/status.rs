//! Status and confirmation message types for operation feedback.

use std::{fmt, path::PathBuf};

use crate::connection::ConnectionState;

/// Wrapper type for displaying operation confirmation messages.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    /// Create a new success status.
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    /// Create a new failure status.
    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}",
            if self.success { "Success:" } else { "Error:" },
            self.message
        )
    }
}

/// Overview of an open database.
#[derive(Debug, Clone)]
pub struct DatabaseStatus {
    pub name: String,
    pub version: u32,
    pub path: PathBuf,
    pub state: ConnectionState,
    /// Record count per store, in store name order
    pub stores: Vec<(String, u64)>,
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} (version {})", self.name, self.version)?;
        writeln!(f)?;
        writeln!(f, "- **Path**: {}", self.path.display())?;
        writeln!(f, "- **Connection**: {}", self.state)?;
        writeln!(f)?;
        writeln!(f, "## Stores")?;
        writeln!(f)?;
        for (store, count) in &self.stores {
            writeln!(f, "- {store}: {count} record(s)")?;
        }
        Ok(())
    }
}
