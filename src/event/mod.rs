//! Trigger event payloads.
//!
//! A scheduled trigger hands each job an opaque JSON object. Only the pruner
//! reads fields from it: `account` (required) and `days` (optional). Fields
//! are validated on access so malformed payloads fail before any provider
//! call is made.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::retention::RetentionDays;

/// Event key naming the account whose snapshots are pruned.
pub const ACCOUNT_FIELD: &str = "account";

/// Event key overriding the retention window in days.
pub const DAYS_FIELD: &str = "days";

/// Errors raised while loading or reading a trigger event.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EventError {
    /// Raised when the payload is not valid JSON.
    #[error("event payload is not valid JSON: {message}")]
    Parse {
        /// Parser error message.
        message: String,
    },
    /// Raised when the payload is valid JSON but not an object.
    #[error("event payload must be a JSON object")]
    NotAnObject,
    /// Raised when a required field is absent.
    #[error("event is missing required field `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },
    /// Raised when a field is present but has the wrong shape.
    #[error("event field `{field}` is invalid: {message}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },
    /// Raised when an event file cannot be read.
    #[error("failed to read event file `{path}`: {message}")]
    FileRead {
        /// Path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

/// JSON object delivered by the trigger.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TriggerEvent {
    fields: Map<String, Value>,
}

impl TriggerEvent {
    /// Wraps an already-parsed JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parses an event from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Parse`] for invalid JSON and
    /// [`EventError::NotAnObject`] when the top-level value is not an object.
    pub fn from_json(payload: &str) -> Result<Self, EventError> {
        let value: Value = serde_json::from_str(payload).map_err(|err| EventError::Parse {
            message: err.to_string(),
        })?;
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            _ => Err(EventError::NotAnObject),
        }
    }

    /// Reads and parses an event from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::FileRead`] when the file cannot be read, or the
    /// errors of [`TriggerEvent::from_json`] for its content.
    pub fn from_file(path: &Utf8Path) -> Result<Self, EventError> {
        let content = read_to_string_ambient(path).map_err(|message| EventError::FileRead {
            path: path.to_string(),
            message,
        })?;
        Self::from_json(&content)
    }

    /// Returns the account identifier from the `account` field.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingField`] when absent and
    /// [`EventError::InvalidField`] when not a non-blank string.
    pub fn account(&self) -> Result<&str, EventError> {
        let value = self
            .fields
            .get(ACCOUNT_FIELD)
            .ok_or_else(|| EventError::MissingField {
                field: ACCOUNT_FIELD.to_owned(),
            })?;
        let account = value
            .as_str()
            .ok_or_else(|| invalid(ACCOUNT_FIELD, "expected a string"))?;
        if account.trim().is_empty() {
            return Err(invalid(ACCOUNT_FIELD, "must not be blank"));
        }
        Ok(account)
    }

    /// Returns the retention window from the `days` field, or `default` when
    /// the field is absent or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidField`] unless `days` is an integer in
    /// `0..=u32::MAX`.
    pub fn retention_days(&self, default: RetentionDays) -> Result<RetentionDays, EventError> {
        let Some(value) = self.fields.get(DAYS_FIELD).filter(|value| !value.is_null()) else {
            return Ok(default);
        };
        if value.as_i64().is_some_and(i64::is_negative) {
            return Err(invalid(DAYS_FIELD, "must not be negative"));
        }
        let days = value
            .as_u64()
            .ok_or_else(|| invalid(DAYS_FIELD, "expected a whole number of days"))?;
        u32::try_from(days)
            .map(RetentionDays::new)
            .map_err(|_| invalid(DAYS_FIELD, "is too large"))
    }
}

fn invalid(field: &str, message: &str) -> EventError {
    EventError::InvalidField {
        field: field.to_owned(),
        message: message.to_owned(),
    }
}

fn read_to_string_ambient(path: &Utf8Path) -> Result<String, String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("path has no file name: {path}"))?;
    let dir_path = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_name).map_err(|err| err.to_string())
}
