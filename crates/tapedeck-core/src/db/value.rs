//! Values stored in object stores and keys used to look them up.

use std::num::TryFromIntError;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// Primary key of a record. Keys above `i64::MAX` cannot be stored.
pub type Key = u64;

/// A stored value: structured JSON, or an opaque binary payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Json(serde_json::Value),
    Blob(Vec<u8>),
}

impl Value {
    /// Serializes `value` into a JSON value.
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Value::Json)
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            Value::Blob(_) => None,
        }
    }

    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            Value::Blob(_) => None,
        }
    }

    pub fn into_blob(self) -> Option<Vec<u8>> {
        match self {
            Value::Blob(bytes) => Some(bytes),
            Value::Json(_) => None,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Blob(bytes)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Json(json) => serde_json::to_string(json)
                .map(|text| ToSqlOutput::Owned(rusqlite::types::Value::Text(text)))
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
            Value::Blob(bytes) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(bytes))),
        }
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(text) => serde_json::from_slice(text)
                .map(Value::Json)
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(bytes) => Ok(Value::Blob(bytes.to_vec())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Value looked up through a store index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    Integer(i64),
    Text(String),
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self {
        IndexKey::Integer(value)
    }
}

impl TryFrom<u64> for IndexKey {
    type Error = TryFromIntError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(IndexKey::Integer)
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Text(value.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        IndexKey::Text(value)
    }
}

impl ToSql for IndexKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            IndexKey::Integer(value) => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Integer(*value))),
            IndexKey::Text(value) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes()))),
        }
    }
}

/// Removes the inline key stored under `key_path` from a JSON object.
///
/// Returns `Ok(None)` when the object carries no key (or a null one), and an
/// error message when the key is not a non-negative integer.
pub(crate) fn split_key(
    value: &mut serde_json::Value,
    key_path: &str,
) -> Result<Option<Key>, String> {
    let Some(object) = value.as_object_mut() else {
        return Ok(None);
    };
    match object.remove(key_path) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(key) => key
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("key '{key_path}' must be a non-negative integer, got {key}")),
    }
}

/// Writes `key` into a JSON object under `key_path`.
pub(crate) fn inject_key(value: &mut serde_json::Value, key_path: &str, key: Key) {
    if let Some(object) = value.as_object_mut() {
        object.insert(key_path.to_string(), serde_json::Value::from(key));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_split_key_removes_inline_key() {
        let mut value = json!({"id": 7, "name": "Folder A"});
        assert_eq!(split_key(&mut value, "id"), Ok(Some(7)));
        assert_eq!(value, json!({"name": "Folder A"}));
    }

    #[test]
    fn test_split_key_without_key() {
        let mut value = json!({"name": "Folder A", "id": null});
        assert_eq!(split_key(&mut value, "id"), Ok(None));

        let mut scalar = json!("just a string");
        assert_eq!(split_key(&mut scalar, "id"), Ok(None));
    }

    #[test]
    fn test_split_key_rejects_bad_key() {
        let mut value = json!({"id": "seven"});
        assert!(split_key(&mut value, "id").is_err());

        let mut negative = json!({"id": -1});
        assert!(split_key(&mut negative, "id").is_err());
    }

    #[test]
    fn test_index_key_from_unsigned() {
        assert_eq!(IndexKey::try_from(7u64), Ok(IndexKey::Integer(7)));
        assert!(IndexKey::try_from(u64::MAX).is_err());
    }

    #[test]
    fn test_inject_key() {
        let mut value = json!({"name": "Song 1"});
        inject_key(&mut value, "id", 2);
        assert_eq!(value, json!({"id": 2, "name": "Song 1"}));
    }

    #[test]
    fn test_value_accessors() {
        let blob = Value::from(vec![1u8, 2, 3]);
        assert!(blob.as_json().is_none());
        assert_eq!(blob.into_blob(), Some(vec![1, 2, 3]));

        let json = Value::json(&json!({"a": 1})).unwrap();
        assert_eq!(json.into_json(), Some(json!({"a": 1})));
    }
}
