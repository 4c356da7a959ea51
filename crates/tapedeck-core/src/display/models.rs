//! Display implementations for domain models.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    connection::ConnectionState,
    models::{RecordingInfo, TreeNode},
};

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_recording() { "item" } else { "folder" };
        writeln!(f, "## {}. {} ({kind})", self.id, self.name)?;
        writeln!(f)?;

        if self.is_top_level() {
            writeln!(f, "- **Parent**: none")?;
        } else {
            writeln!(f, "- **Parent**: {}", self.parent_key)?;
        }
        writeln!(f, "- **Created**: {}", LocalDateTime(&self.date))?;

        if let Some(recording) = &self.recording {
            write!(f, "{recording}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for RecordingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- **Recording**: {} samples at {} Hz ({:.2}s)",
            self.n_samples,
            self.sample_rate,
            self.duration_secs()
        )?;
        let keys = self.chunk_keys();
        if keys.is_empty() {
            writeln!(f, "- **Chunks**: none")
        } else {
            writeln!(
                f,
                "- **Chunks**: {} ({}..={}, {} samples each)",
                self.chunk_count(),
                keys.start,
                keys.end - 1,
                self.chunk_length
            )
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ConnectionState::Unopened => "unopened",
            ConnectionState::Opening => "opening",
            ConnectionState::Migrating => "migrating",
            ConnectionState::Ready => "ready",
        };
        f.write_str(state)
    }
}
