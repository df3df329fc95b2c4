//! `extract_csv_data`: filter the rows of a data source.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::args::Encoded;
use super::table::Table;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ExtractArgs {
    pub csv_name: String,
    pub filters: Encoded<Map<String, Value>>,
}

/// Rows selected by a set of filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub csv_name: String,
    pub extracted_data: Vec<Map<String, Value>>,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Keeps the rows of `table` matching every filter.
///
/// A filter value that is a list matches any of its elements; any other value
/// must equal the cell. Unknown columns are an error.
pub fn apply_filters(
    csv_name: &str,
    table: &Table,
    filters: &Map<String, Value>,
) -> Result<Extraction, String> {
    let mut predicates = Vec::with_capacity(filters.len());
    for (column, wanted) in filters {
        let idx = table.column_index(column).ok_or_else(|| {
            format!(
                "Column '{}' not found in {}. Available columns: {:?}",
                column, csv_name, table.columns
            )
        })?;
        predicates.push((idx, wanted));
    }

    let extracted_data: Vec<Map<String, Value>> = table
        .rows
        .iter()
        .filter(|row| {
            predicates
                .iter()
                .all(|(idx, wanted)| filter_matches(&row[*idx], wanted))
        })
        .map(|row| table.record(row))
        .collect();

    Ok(Extraction {
        csv_name: csv_name.to_string(),
        row_count: extracted_data.len(),
        extracted_data,
        columns: table.columns.clone(),
    })
}

fn filter_matches(cell: &Value, wanted: &Value) -> bool {
    match wanted {
        Value::Array(options) => options.iter().any(|option| cells_equal(cell, option)),
        scalar => cells_equal(cell, scalar),
    }
}

/// Numbers compare numerically, text exactly; nothing else ever matches.
fn cells_equal(cell: &Value, wanted: &Value) -> bool {
    match (cell, wanted) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}
