//! JSON-backed record source.
//!
//! Loads a document of the shape
//!
//! ```json
//! {
//!   "tables": {
//!     "Listings": {
//!       "records": [
//!         { "id": "lst1", "name": "Harbour Works",
//!           "fields": { "Address": "1 Quay St", "Distance": 3.25,
//!                       "Category": ["Retail"] } }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! and exposes it through the engine's [`RecordSource`]/[`RecordTable`]
//! traits. Cells are typed loosely in the document; the typed readers
//! return `None` when a cell does not match the requested type.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use siteline_core::{RecordSource, RecordTable};

/// Errors raised while loading a JSON record source.
#[derive(Debug, Error)]
pub enum JsonSourceError {
    /// Reading the file failed.
    #[error("failed to read record source at {path}: {source}")]
    Io {
        /// Location of the document on disk.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document did not match the expected shape.
    #[error("failed to parse record source: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct Document {
    #[serde(default)]
    tables: HashMap<String, JsonTable>,
}

/// One table from the document.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonTable {
    #[serde(default)]
    records: Vec<JsonRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

impl JsonTable {
    fn record(&self, record_id: &str) -> Option<&JsonRecord> {
        self.records.iter().find(|record| record.id == record_id)
    }

    fn cell(&self, record_id: &str, field: &str) -> Option<&Value> {
        self.record(record_id)
            .and_then(|record| record.fields.get(field))
    }
}

impl RecordTable for JsonTable {
    fn record_ids(&self) -> Vec<String> {
        self.records.iter().map(|record| record.id.clone()).collect()
    }

    fn display_name(&self, record_id: &str) -> Option<String> {
        self.record(record_id)
            .map(|record| record.name.clone().unwrap_or_else(|| record.id.clone()))
    }

    fn text_cell(&self, record_id: &str, field: &str) -> Option<String> {
        match self.cell(record_id, field) {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        }
    }

    fn number_cell(&self, record_id: &str, field: &str) -> Option<f64> {
        self.cell(record_id, field).and_then(Value::as_f64)
    }

    fn linked_cell(&self, record_id: &str, field: &str) -> Vec<String> {
        match self.cell(record_id, field) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// [`RecordSource`] over a parsed JSON document.
///
/// # Examples
/// ```
/// use siteline_core::RecordSource;
/// use siteline_data::source::JsonRecordSource;
///
/// let source = JsonRecordSource::from_str(r#"{
///     "tables": { "Listings": { "records": [
///         { "id": "lst1", "name": "Harbour Works",
///           "fields": { "Address": "1 Quay St" } }
///     ] } }
/// }"#)?;
/// let table = source.table("Listings").expect("table exists");
/// assert_eq!(table.text_cell("lst1", "Address").as_deref(), Some("1 Quay St"));
/// # Ok::<(), siteline_data::source::JsonSourceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    document: Document,
}

impl JsonRecordSource {
    /// Parse a source from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSourceError::Parse`] when the document does not match
    /// the expected shape.
    #[allow(clippy::should_implement_trait, reason = "fallible, not FromStr")]
    pub fn from_str(json: &str) -> Result<Self, JsonSourceError> {
        let document = serde_json::from_str(json)?;
        Ok(Self { document })
    }

    /// Load a source from a file.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSourceError::Io`] when the file cannot be read and
    /// [`JsonSourceError::Parse`] when it does not match the expected shape.
    pub fn from_path(path: &Path) -> Result<Self, JsonSourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| JsonSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&text)
    }

    /// Names of the tables in the document, unordered.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.document.tables.keys().map(String::as_str).collect()
    }
}

impl RecordSource for JsonRecordSource {
    fn table(&self, name: &str) -> Option<&dyn RecordTable> {
        self.document
            .tables
            .get(name)
            .map(|table| table as &dyn RecordTable)
    }
}
