//! JSON (de)serialization helpers shared by the SQLite and Postgres
//! checkpointers, so each storage module can stay focused on SQL.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::checkpointer_sqlite::SQLiteCheckpointerError;

pub fn serialize_json<T: Serialize>(
    value: &T,
    field: &'static str,
) -> Result<String, SQLiteCheckpointerError> {
    serde_json::to_string(value).map_err(|_| {
        SQLiteCheckpointerError::Other(format!("failed to serialize {field}"))
    })
}

pub fn deserialize_json<T: DeserializeOwned>(
    payload: &str,
    field: &'static str,
) -> Result<T, SQLiteCheckpointerError> {
    serde_json::from_str(payload)
        .map_err(|_| SQLiteCheckpointerError::Other(format!("failed to deserialize {field}")))
}

pub fn deserialize_json_value<T: DeserializeOwned>(
    value: Value,
    field: &'static str,
) -> Result<T, SQLiteCheckpointerError> {
    serde_json::from_value(value)
        .map_err(|_| SQLiteCheckpointerError::Other(format!("failed to deserialize {field}")))
}

pub fn require_json_field(
    value: Option<String>,
    field: &'static str,
) -> Result<String, SQLiteCheckpointerError> {
    value.ok_or(SQLiteCheckpointerError::Missing(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_value() {
        let encoded = serialize_json(&vec!["a", "b"], "list").unwrap();
        let decoded: Vec<String> = deserialize_json(&encoded, "list").unwrap();
        assert_eq!(decoded, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn missing_field_is_reported() {
        let err = require_json_field(None, "state_json").unwrap_err();
        assert!(matches!(err, SQLiteCheckpointerError::Missing("state_json")));
    }
}
