//! `create_chart`: turn tabular data into a chart configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::args::Encoded;
use super::table::cell_label;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ChartArgs {
    pub data: Encoded<Value>,
    pub chart_type: String,
    pub x_column: String,
    pub y_column: String,
}

/// Supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
}

impl ChartType {
    const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Area,
        ChartType::Scatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
            ChartType::Scatter => "scatter",
        }
    }

    /// Whether the data is rendered as an x → y series rather than records.
    fn is_series(&self) -> bool {
        matches!(self, ChartType::Bar | ChartType::Line | ChartType::Area)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(ChartType::as_str).collect();
                format!("Unsupported chart type '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

/// A chart ready to be rendered by a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub render_type: &'static str,
    pub chart_type: ChartType,
    pub data: Value,
    pub x_column: String,
    pub y_column: String,
    pub title: String,
    pub data_points: usize,
    pub status: &'static str,
}

/// Tabular data as handed over by the model.
#[derive(Debug, Clone, PartialEq)]
struct Frame {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Frame {
    /// Accepts a list of records or an object of equally long columns.
    fn from_value(data: Value) -> Result<Self, String> {
        match data {
            Value::Array(items) => {
                let mut columns: Vec<String> = Vec::new();
                let mut rows = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Object(record) = item else {
                        return Err("Data records must be JSON objects".to_string());
                    };
                    for key in record.keys() {
                        if !columns.contains(key) {
                            columns.push(key.clone());
                        }
                    }
                    rows.push(record);
                }
                Ok(Self { columns, rows })
            }
            Value::Object(by_column) => {
                let mut length = None;
                for (name, values) in &by_column {
                    let Value::Array(values) = values else {
                        return Err(format!("Column '{}' must be a JSON array", name));
                    };
                    match length {
                        None => length = Some(values.len()),
                        Some(len) if len != values.len() => {
                            return Err("All arrays must be of the same length".to_string());
                        }
                        Some(_) => {}
                    }
                }

                let columns: Vec<String> = by_column.keys().cloned().collect();
                let rows = (0..length.unwrap_or(0))
                    .map(|idx| {
                        by_column
                            .iter()
                            .map(|(name, values)| (name.clone(), values[idx].clone()))
                            .collect()
                    })
                    .collect();
                Ok(Self { columns, rows })
            }
            _ => Err("Data must be a JSON array of records or an object of columns".to_string()),
        }
    }

    fn require(&self, column: &str) -> Result<(), String> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(format!(
                "Column '{}' not found. Available: {:?}",
                column, self.columns
            ))
        }
    }
}

/// Builds the chart configuration for `data`.
pub fn build_chart(
    data: Value,
    chart_type: ChartType,
    x_column: &str,
    y_column: &str,
) -> Result<ChartConfig, String> {
    let frame = Frame::from_value(data)?;
    frame.require(x_column)?;
    frame.require(y_column)?;

    let cell = |row: &Map<String, Value>, column: &str| row.get(column).cloned().unwrap_or(Value::Null);

    let chart_data = if chart_type.is_series() {
        let series: Map<String, Value> = frame
            .rows
            .iter()
            .map(|row| (cell_label(&cell(row, x_column)), cell(row, y_column)))
            .collect();
        Value::Object(series)
    } else {
        frame
            .rows
            .iter()
            .map(|row| {
                let mut point = Map::new();
                point.insert(x_column.to_string(), cell(row, x_column));
                point.insert(y_column.to_string(), cell(row, y_column));
                Value::Object(point)
            })
            .collect()
    };

    Ok(ChartConfig {
        render_type: "chart",
        chart_type,
        data: chart_data,
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        title: format!("{} by {}", y_column, x_column),
        data_points: frame.rows.len(),
        status: "success",
    })
}
