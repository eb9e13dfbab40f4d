//! Values, rows and statement results

use crate::error::{DatabaseError, DatabaseResult};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A single SQL value, used both for bound parameters and result columns
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Integer(i) => JsonValue::from(*i),
            DatabaseValue::Real(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::Text(s) => JsonValue::String(s.clone()),
            DatabaseValue::Blob(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect()),
        }
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Integer(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Integer(value.into())
    }
}

impl From<u32> for DatabaseValue {
    fn from(value: u32) -> Self {
        DatabaseValue::Integer(value.into())
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Integer(value.into())
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Real(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::Text(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Blob(value)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DatabaseValue::Null)
    }
}

/// Outcome of a statement run through `query`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Row id of the inserted row; only set for `INSERT` statements
    pub insert_id: Option<i64>,
    /// Rows changed by the statement
    pub changes: u64,
}

/// A result row: column names in select order with their values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, DatabaseValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, DatabaseValue)>) -> Self {
        Self { columns }
    }

    /// Raw value of a column
    pub fn value(&self, column: &str) -> Option<&DatabaseValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Get a typed value from a column
    pub fn get<T: DeserializeOwned>(&self, column: &str) -> DatabaseResult<T> {
        let value = self
            .value(column)
            .ok_or_else(|| DatabaseError::ColumnNotFound(column.to_string()))?;

        serde_json::from_value(value.to_json()).map_err(|e| {
            DatabaseError::Serialization(format!("Failed to deserialize column '{}': {}", column, e))
        })
    }

    /// Like [`Row::get`], but a missing column or NULL yields `None`
    pub fn try_get<T: DeserializeOwned>(&self, column: &str) -> DatabaseResult<Option<T>> {
        match self.value(column) {
            None | Some(DatabaseValue::Null) => Ok(None),
            Some(_) => self.get(column).map(Some),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert row to a JSON object
    pub fn to_json(&self) -> JsonValue {
        let map: serde_json::Map<String, JsonValue> = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }

    /// Deserialize the whole row into a struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> DatabaseResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl IntoIterator for Row {
    type Item = (String, DatabaseValue);
    type IntoIter = std::vec::IntoIter<(String, DatabaseValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
