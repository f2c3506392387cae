//! Typed access to JSON response documents.
//!
//! `get_*` accessors are for required fields: absence (or `null`) and type
//! mismatches fail with a [`ParsingError`] naming the field. `opt_*` accessors
//! are for optional fields and never fail; anything that is not a value of
//! the requested type reads as `None`.

use crate::error::ParsingError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A JSON object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataObject {
    fields: Map<String, Value>,
}

impl DataObject {
    /// Parse raw bytes into an object.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError::Malformed`] when the bytes are not JSON or the
    /// top-level value is not an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParsingError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ParsingError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Wrap an already parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError::Malformed`] when `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, ParsingError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ParsingError::Malformed(format!(
                "expected an object, found {}",
                type_name(&other)
            ))),
        }
    }

    /// Whether `key` is present and not `null`.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(|v| !v.is_null())
    }

    /// Whether `key` is absent or explicitly `null`.
    #[must_use]
    pub fn is_null(&self, key: &str) -> bool {
        !self.has(key)
    }

    /// Field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Raw value of a field.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn require(&self, key: &str) -> Result<&Value, ParsingError> {
        self.raw(key)
            .ok_or_else(|| ParsingError::MissingField(key.to_string()))
    }

    /// Required string.
    ///
    /// # Errors
    ///
    /// Missing field or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ParsingError> {
        self.require(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(key, "string"))
    }

    /// Required integer.
    ///
    /// # Errors
    ///
    /// Missing field or not an integer.
    pub fn get_i64(&self, key: &str) -> Result<i64, ParsingError> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| mismatch(key, "integer"))
    }

    /// Required floating point number (integers are accepted).
    ///
    /// # Errors
    ///
    /// Missing field or not a number.
    pub fn get_f64(&self, key: &str) -> Result<f64, ParsingError> {
        self.require(key)?
            .as_f64()
            .ok_or_else(|| mismatch(key, "number"))
    }

    /// Required boolean.
    ///
    /// # Errors
    ///
    /// Missing field or not a boolean.
    pub fn get_bool(&self, key: &str) -> Result<bool, ParsingError> {
        self.require(key)?
            .as_bool()
            .ok_or_else(|| mismatch(key, "boolean"))
    }

    /// Required nested object.
    ///
    /// # Errors
    ///
    /// Missing field or not an object.
    pub fn get_object(&self, key: &str) -> Result<Self, ParsingError> {
        match self.require(key)? {
            Value::Object(fields) => Ok(Self {
                fields: fields.clone(),
            }),
            _ => Err(mismatch(key, "object")),
        }
    }

    /// Required array.
    ///
    /// # Errors
    ///
    /// Missing field or not an array.
    pub fn get_array(&self, key: &str) -> Result<DataArray, ParsingError> {
        match self.require(key)? {
            Value::Array(items) => Ok(DataArray {
                items: items.clone(),
            }),
            _ => Err(mismatch(key, "array")),
        }
    }

    /// Required unix timestamp (seconds).
    ///
    /// # Errors
    ///
    /// Missing field, not an integer, or out of the representable range.
    pub fn get_timestamp(&self, key: &str) -> Result<DateTime<Utc>, ParsingError> {
        let seconds = self.get_i64(key)?;
        DateTime::from_timestamp(seconds, 0).ok_or_else(|| mismatch(key, "unix timestamp"))
    }

    /// Optional string.
    #[must_use]
    pub fn opt_string(&self, key: &str) -> Option<String> {
        self.raw(key).and_then(Value::as_str).map(str::to_string)
    }

    /// Optional integer.
    #[must_use]
    pub fn opt_i64(&self, key: &str) -> Option<i64> {
        self.raw(key).and_then(Value::as_i64)
    }

    /// Optional number.
    #[must_use]
    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        self.raw(key).and_then(Value::as_f64)
    }

    /// Optional boolean.
    #[must_use]
    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.raw(key).and_then(Value::as_bool)
    }

    /// Optional nested object.
    #[must_use]
    pub fn opt_object(&self, key: &str) -> Option<Self> {
        match self.raw(key) {
            Some(Value::Object(fields)) => Some(Self {
                fields: fields.clone(),
            }),
            _ => None,
        }
    }

    /// Optional array.
    #[must_use]
    pub fn opt_array(&self, key: &str) -> Option<DataArray> {
        match self.raw(key) {
            Some(Value::Array(items)) => Some(DataArray {
                items: items.clone(),
            }),
            _ => None,
        }
    }

    /// Optional unix timestamp.
    #[must_use]
    pub fn opt_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.opt_i64(key)
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    /// Integer defaulting to `0`.
    #[must_use]
    pub fn i64_or_zero(&self, key: &str) -> i64 {
        self.opt_i64(key).unwrap_or(0)
    }

    /// Boolean defaulting to `false`.
    #[must_use]
    pub fn bool_or_false(&self, key: &str) -> bool {
        self.opt_bool(key).unwrap_or(false)
    }

    /// Back to a plain JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// A JSON array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataArray {
    items: Vec<Value>,
}

impl DataArray {
    /// Wrap an already parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError::Malformed`] when `value` is not an array.
    pub fn from_value(value: Value) -> Result<Self, ParsingError> {
        match value {
            Value::Array(items) => Ok(Self { items }),
            other => Err(ParsingError::Malformed(format!(
                "expected an array, found {}",
                type_name(&other)
            ))),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Object at `index`.
    ///
    /// # Errors
    ///
    /// Out of bounds or not an object; the error names the index.
    pub fn get_object(&self, index: usize) -> Result<DataObject, ParsingError> {
        match self.items.get(index) {
            Some(Value::Object(fields)) => Ok(DataObject {
                fields: fields.clone(),
            }),
            Some(_) => Err(mismatch(&format!("[{index}]"), "object")),
            None => Err(ParsingError::MissingField(format!("[{index}]"))),
        }
    }

    /// String at `index`.
    ///
    /// # Errors
    ///
    /// Out of bounds or not a string; the error names the index.
    pub fn get_string(&self, index: usize) -> Result<String, ParsingError> {
        match self.items.get(index) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(mismatch(&format!("[{index}]"), "string")),
            None => Err(ParsingError::MissingField(format!("[{index}]"))),
        }
    }

    /// Every element as an object, in order.
    pub fn objects(&self) -> impl Iterator<Item = Result<DataObject, ParsingError>> + '_ {
        (0..self.items.len()).map(|i| self.get_object(i))
    }

    /// Decode every element with `f`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first error returned by `f` or by the element access.
    pub fn map_objects<T, F>(&self, mut f: F) -> Result<Vec<T>, ParsingError>
    where
        F: FnMut(&DataObject) -> Result<T, ParsingError>,
    {
        self.objects().map(|obj| f(&obj?)).collect()
    }
}

fn mismatch(field: &str, expected: &'static str) -> ParsingError {
    ParsingError::TypeMismatch {
        field: field.to_string(),
        expected,
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
