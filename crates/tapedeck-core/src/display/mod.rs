//! Display formatting functions and result types.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers here add context such as collection headings or the outcome
//! of an operation. All output is markdown, rendered by the CLI's terminal
//! renderer or printed as plain text.
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrapper types ([`Nodes`])
//! - [`results`]: Operation result types (CreateResult, UpdateResult, DeleteResult)
//! - [`status`]: Status messages and database overview
//! - [`datetime`]: Date/time formatting utilities
//! - [`models`]: Display implementations for domain models
//!
//! ## Usage Examples
//!
//! ```rust
//! use jiff::Timestamp;
//! use tapedeck_core::{display::CreateResult, models::NewTreeNode, DB_NO_KEY};
//!
//! let node = NewTreeNode::folder("Folder A", DB_NO_KEY)
//!     .with_date(Timestamp::UNIX_EPOCH)
//!     .into_node(1);
//!
//! let output = CreateResult::new(node).to_string();
//! assert!(output.contains("Created node with ID: 1"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::Nodes;
pub use datetime::LocalDateTime;
pub use results::{CreateResult, DeleteResult, UpdateResult};
pub use status::{DatabaseStatus, OperationStatus};
