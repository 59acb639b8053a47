//! Dataset documents and their on-disk layout.
//!
//! A dataset is either a bare JSON array of rows or an object that wraps the
//! array under a known key. The layout is remembered so a checkpoint can be
//! written back in the same schema it was read in.

use trash_bin_map_record_models::RawRecord;

use crate::SourceError;

/// Wrapper keys recognized around the record array, tried in order.
pub const WRAPPER_KEYS: &[&str] = &["data", "items", "데이터"];

/// How the record array sits inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentLayout {
    /// The document is the array itself.
    #[default]
    BareArray,
    /// The array lives under `key`; `envelope` holds every sibling key.
    Wrapped {
        /// Wrapper key holding the records.
        key: String,
        /// The rest of the wrapping object.
        envelope: serde_json::Map<String, serde_json::Value>,
    },
}

/// A parsed dataset document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Rows in source order.
    pub records: Vec<RawRecord>,
    /// Where the rows came from inside the document.
    pub layout: DocumentLayout,
}

impl Dataset {
    /// Parses a dataset from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Json`] for invalid JSON and
    /// [`SourceError::Malformed`] for documents without a record array.
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Extracts the record array from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Malformed`] if the document is neither an
    /// array nor an object with a known wrapper key, or if a row is not a
    /// JSON object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SourceError> {
        match value {
            serde_json::Value::Array(rows) => Ok(Self {
                records: into_records(rows)?,
                layout: DocumentLayout::BareArray,
            }),
            serde_json::Value::Object(mut envelope) => {
                for key in WRAPPER_KEYS {
                    if !envelope.get(*key).is_some_and(serde_json::Value::is_array) {
                        continue;
                    }
                    if let Some(serde_json::Value::Array(rows)) = envelope.remove(*key) {
                        return Ok(Self {
                            records: into_records(rows)?,
                            layout: DocumentLayout::Wrapped {
                                key: (*key).to_string(),
                                envelope,
                            },
                        });
                    }
                }
                Err(SourceError::Malformed {
                    message: format!(
                        "expected a record array or one of {WRAPPER_KEYS:?}, found keys {:?}",
                        envelope.keys().collect::<Vec<_>>()
                    ),
                })
            }
            other => Err(SourceError::Malformed {
                message: format!("expected a record array, found {}", kind_of(&other)),
            }),
        }
    }

    /// Renders the dataset back into a document with its original layout.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        let rows = serde_json::Value::Array(
            self.records
                .iter()
                .cloned()
                .map(serde_json::Value::Object)
                .collect(),
        );
        match &self.layout {
            DocumentLayout::BareArray => rows,
            DocumentLayout::Wrapped { key, envelope } => {
                let mut object = envelope.clone();
                object.insert(key.clone(), rows);
                serde_json::Value::Object(object)
            }
        }
    }
}

fn into_records(rows: Vec<serde_json::Value>) -> Result<Vec<RawRecord>, SourceError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(SourceError::Malformed {
                message: format!("record {i} is {}, not an object", kind_of(&other)),
            }),
        })
        .collect()
}

const fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
