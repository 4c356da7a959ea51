//! Naming helpers for the SQL objects that back object stores.

use crate::error::SchemaError;

const STORE_TABLE_PREFIX: &str = "store_";
const INDEX_PREFIX: &str = "index_";

/// Checks that a store, index or key path name is safe to embed in SQL.
///
/// Names are ASCII letters, digits and underscores, start with a letter, and
/// are at most 64 characters long.
pub fn validate_name(name: &str) -> Result<(), SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let first = name.chars().next().ok_or_else(|| invalid("name is empty"))?;
    if !first.is_ascii_alphabetic() {
        return Err(invalid("name must start with an ASCII letter"));
    }
    if name.len() > 64 {
        return Err(invalid("name is longer than 64 characters"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "name may only contain ASCII letters, digits and underscores",
        ));
    }
    Ok(())
}

/// Table holding the records of a store.
pub fn store_table(store: &str) -> String {
    format!("{STORE_TABLE_PREFIX}{store}")
}

/// SQL index backing a store index.
pub fn index_name(store: &str, index: &str) -> String {
    format!("{INDEX_PREFIX}{store}_{index}")
}

/// Quotes an SQL identifier.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
