//! In-memory view of a CSV data source.

use std::io::Read;
use std::path::{Component, Path};

use serde_json::{Map, Number, Value};

/// Errors raised while loading a data source.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("CSV file not found: {0}")]
    NotFound(String),
    #[error("Invalid CSV name '{0}': must be a plain file name")]
    InvalidName(String),
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded table: a header row and typed cells.
///
/// Empty cells are `null`, cells that parse as numbers are numbers and
/// everything else is kept as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Loads `csv_name` from `dir`, reading the file fresh.
    pub fn load(dir: &Path, csv_name: &str) -> Result<Self, DataError> {
        let mut components = Path::new(csv_name).components();
        let is_plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !is_plain {
            return Err(DataError::InvalidName(csv_name.to_string()));
        }

        let path = dir.join(csv_name);
        if !path.is_file() {
            return Err(DataError::NotFound(csv_name.to_string()));
        }

        Self::from_reader(std::fs::File::open(path)?)
    }

    /// Parses CSV text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = (0..columns.len())
                .map(|idx| record.get(idx).map_or(Value::Null, parse_cell))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Returns the position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Iterates over the cells of one column.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Returns the number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Converts one row into a record keyed by column name.
    pub fn record(&self, row: &[Value]) -> Map<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }

    /// Converts all rows into records.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }
}

/// Parses a raw CSV cell into a JSON value.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

/// Renders a cell as a map key or label.
pub fn cell_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
