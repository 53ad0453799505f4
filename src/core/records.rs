//! JSON encoding of the records kept in a [`KeyValueStore`].

use std::error::Error as StdError;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::store::{KeyValueStore, StoreError};

/// Failure to read or write a stored record.
///
/// A missing record is not an error; readers get `None` instead.
#[derive(Debug)]
pub enum RecordError {
    Store(StoreError),
    /// The stored value under `key` is not a valid record.
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Store(err) => write!(f, "{err}"),
            RecordError::Corrupt { key, source } => {
                write!(f, "Stored record '{key}' is unreadable: {source}")
            }
            RecordError::Encode { key, source } => {
                write!(f, "Could not encode record '{key}': {source}")
            }
        }
    }
}

impl StdError for RecordError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RecordError::Store(err) => Some(err),
            RecordError::Corrupt { source, .. } => Some(source),
            RecordError::Encode { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for RecordError {
    fn from(err: StoreError) -> Self {
        RecordError::Store(err)
    }
}

pub fn read_record<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, RecordError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| RecordError::Corrupt {
            key: key.to_string(),
            source,
        })
}

pub fn write_record<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), RecordError> {
    let encoded = serde_json::to_string(value).map_err(|source| RecordError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded)?;
    Ok(())
}
