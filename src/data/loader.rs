//! Record table loading from JSON and JSON Lines files.

use crate::models::{RecordTable, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while reading the record table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {row} is not a JSON object")]
    NotAnObject { row: usize },

    #[error("row {row}, field '{field}': nested values are not supported")]
    NestedValue { row: usize, field: String },

    #[error("the data file contains no records")]
    Empty,
}

/// On-disk layout of the record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// A single JSON array of objects.
    JsonArray,
    /// One JSON object per line.
    JsonLines,
}

impl DataFormat {
    /// Pick a format from the file extension, falling back to sniffing the
    /// first non-whitespace character.
    pub fn detect(path: &Path, content: &str) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => DataFormat::JsonLines,
            _ if content.trim_start().starts_with('[') => DataFormat::JsonArray,
            _ => DataFormat::JsonLines,
        }
    }
}

/// Load the record table from a file.
pub fn load_table(path: &Path) -> Result<RecordTable, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = DataFormat::detect(path, &content);
    debug!("Reading {} as {:?}", path.display(), format);

    let table = parse_table(&content, format)?;
    info!(
        "Loaded {} records with {} fields from {}",
        table.len(),
        table.schema().len(),
        path.display()
    );

    Ok(table)
}

/// Parse a record table from an in-memory string.
pub fn parse_table(content: &str, format: DataFormat) -> Result<RecordTable, LoadError> {
    let raw_rows: Vec<serde_json::Value> = match format {
        DataFormat::JsonArray => serde_json::from_str(content).map_err(|source| LoadError::Json {
            line: source.line(),
            source,
        })?,
        DataFormat::JsonLines => {
            let mut rows = Vec::new();
            for (idx, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(line).map_err(|source| LoadError::Json {
                    line: idx + 1,
                    source,
                })?;
                rows.push(row);
            }
            rows
        }
    };

    if raw_rows.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut rows = Vec::with_capacity(raw_rows.len());
    for (idx, raw) in raw_rows.into_iter().enumerate() {
        let row_no = idx + 1;
        let serde_json::Value::Object(object) = raw else {
            return Err(LoadError::NotAnObject { row: row_no });
        };

        let mut fields = Vec::with_capacity(object.len());
        for (field, value) in object {
            let value = convert_value(value).ok_or_else(|| LoadError::NestedValue {
                row: row_no,
                field: field.clone(),
            })?;
            fields.push((field, value));
        }
        rows.push(fields);
    }

    Ok(RecordTable::from_ordered_rows(rows))
}

/// Map a scalar JSON value onto a table cell. Returns `None` for arrays and
/// objects.
fn convert_value(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Missing),
        serde_json::Value::Bool(b) => Some(Value::Text(b.to_string())),
        serde_json::Value::Number(n) => Some(n.as_f64().map_or(Value::Missing, Value::Number)),
        serde_json::Value::String(s) => Some(Value::Text(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}
