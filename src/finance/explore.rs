//! `explore_csv`: describe the structure and content of a data source.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::table::{Table, cell_label};

const EXAMPLE_VALUES: usize = 3;
const TOP_VALUES: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ExploreArgs {
    pub csv_name: String,
}

/// Summary of a whole CSV file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvSummary {
    pub csv_name: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub columns: IndexMap<String, ColumnSummary>,
}

/// Inferred kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation, absent below two values
    pub std: Option<f64>,
}

/// Summary of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    pub stats: Option<NumericStats>,
    pub unique_values: Option<Vec<Value>>,
    pub top_values: Option<IndexMap<String, usize>>,
    pub example_values: Vec<Value>,
}

/// Describes every column of `table`.
///
/// A column is numeric when all its non-null cells are numbers. Other columns
/// are categorical when they have at most `max_unique` distinct values and
/// plain objects otherwise.
pub fn summarize(csv_name: &str, table: &Table, max_unique: usize) -> CsvSummary {
    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<&Value> = table.column(idx).filter(|v| !v.is_null()).collect();
            (name.clone(), summarize_column(&values, max_unique))
        })
        .collect();

    CsvSummary {
        csv_name: csv_name.to_string(),
        num_rows: table.row_count(),
        num_columns: table.columns.len(),
        columns,
    }
}

fn summarize_column(values: &[&Value], max_unique: usize) -> ColumnSummary {
    let example_values = values
        .iter()
        .take(EXAMPLE_VALUES)
        .map(|v| (*v).clone())
        .collect();

    let numbers: Option<Vec<f64>> = values.iter().map(|v| v.as_f64()).collect();
    if let Some(numbers) = numbers.filter(|n| !n.is_empty()) {
        return ColumnSummary {
            kind: ColumnKind::Numeric,
            stats: Some(numeric_stats(&numbers)),
            unique_values: None,
            top_values: None,
            example_values,
        };
    }

    // Distinct values in order of first appearance, with their counts.
    let mut counts: IndexMap<String, (Value, usize)> = IndexMap::new();
    for value in values {
        counts
            .entry(cell_label(value))
            .or_insert_with(|| ((*value).clone(), 0))
            .1 += 1;
    }

    if counts.len() <= max_unique {
        ColumnSummary {
            kind: ColumnKind::Categorical,
            stats: None,
            unique_values: Some(counts.into_values().map(|(value, _)| value).collect()),
            top_values: None,
            example_values,
        }
    } else {
        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(label, (_, count))| (label, count))
            .collect();
        // Stable sort keeps first-appearance order among ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(TOP_VALUES);

        ColumnSummary {
            kind: ColumnKind::Object,
            stats: None,
            unique_values: None,
            top_values: Some(ranked.into_iter().collect()),
            example_values,
        }
    }
}

fn numeric_stats(numbers: &[f64]) -> NumericStats {
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std = (numbers.len() > 1).then(|| {
        let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    });

    NumericStats {
        min,
        max,
        mean,
        std,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_stats() {
        let stats = numeric_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);

        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.mean, 5.0);
        let std = stats.std.unwrap();
        assert!((std - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn test_single_value_has_no_std() {
        assert_eq!(numeric_stats(&[3.0]).std, None);
    }

    #[test]
    fn test_top_values_rank_by_count_then_appearance() {
        let raw: Vec<Value> = ["a", "b", "c", "d", "e", "f", "b", "c", "c"]
            .iter()
            .map(|s| json!(s))
            .collect();
        let values: Vec<&Value> = raw.iter().collect();

        let summary = summarize_column(&values, 3);

        assert_eq!(summary.kind, ColumnKind::Object);
        let top: Vec<(String, usize)> = summary.top_values.unwrap().into_iter().collect();
        assert_eq!(
            top,
            vec![
                ("c".to_string(), 3),
                ("b".to_string(), 2),
                ("a".to_string(), 1),
                ("d".to_string(), 1),
                ("e".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_empty_column_is_categorical() {
        let summary = summarize_column(&[], 10);

        assert_eq!(summary.kind, ColumnKind::Categorical);
        assert_eq!(summary.unique_values, Some(Vec::new()));
        assert!(summary.example_values.is_empty());
    }
}
