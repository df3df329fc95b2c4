//! Data tools over CSV files of financial data.
//!
//! Three tools are exposed to the model:
//!
//! - `explore_csv`: columns, types, statistics and sample values of a file
//! - `extract_csv_data`: rows matching a set of column filters
//! - `create_chart`: a chart configuration built from extracted data
//!
//! Every call reads its file fresh from the fixtures directory, so the tools
//! hold no state besides their [`FinanceSettings`].

pub mod args;
pub mod chart;
pub mod explore;
pub mod extract;
pub mod table;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::tool::{ParamSpec, Tool, ToolError, ToolRegistry};
use args::parse_args;
use chart::{ChartArgs, ChartType, build_chart};
use explore::{ExploreArgs, summarize};
use extract::{ExtractArgs, apply_filters};
use table::Table;

pub use chart::ChartConfig;
pub use explore::{ColumnKind, CsvSummary};
pub use extract::Extraction;

/// Settings shared by the finance tools.
#[derive(Debug, Clone)]
pub struct FinanceSettings {
    /// Directory holding the CSV files
    pub fixtures_dir: PathBuf,
    /// Maximum distinct values for a text column to count as categorical
    pub max_unique: usize,
}

impl Default for FinanceSettings {
    fn default() -> Self {
        Self {
            fixtures_dir: PathBuf::from("fixtures"),
            max_unique: 10,
        }
    }
}

impl FinanceSettings {
    /// Creates settings reading files from `fixtures_dir`.
    pub fn new(fixtures_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixtures_dir: fixtures_dir.into(),
            ..Self::default()
        }
    }
}

/// The finance tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinanceToolKind {
    ExploreCsv,
    ExtractCsvData,
    CreateChart,
}

impl FinanceToolKind {
    /// All tools, in the order they are offered to the model.
    pub const ALL: [FinanceToolKind; 3] = [
        FinanceToolKind::ExploreCsv,
        FinanceToolKind::ExtractCsvData,
        FinanceToolKind::CreateChart,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FinanceToolKind::ExploreCsv => "explore_csv",
            FinanceToolKind::ExtractCsvData => "extract_csv_data",
            FinanceToolKind::CreateChart => "create_chart",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FinanceToolKind::ExploreCsv => {
                "Explore the structure and content of a CSV file, including data types, unique values, and example data. Use this first to understand what data is available."
            }
            FinanceToolKind::ExtractCsvData => {
                "Extract rows from a CSV file based on specified filter conditions. Returns filtered data with a sample preview. The filters parameter must be a JSON string."
            }
            FinanceToolKind::CreateChart => {
                "Prepare chart configuration (bar, line, pie, area, or scatter) from data. Returns chart config for visualization."
            }
        }
    }

    pub fn parameters(&self) -> Vec<ParamSpec> {
        match self {
            FinanceToolKind::ExploreCsv => vec![ParamSpec::text(
                "csv_name",
                "Name of the CSV file (e.g., 'actuals.csv', 'budget.csv', 'fx.csv', 'cash.csv')",
            )],
            FinanceToolKind::ExtractCsvData => vec![
                ParamSpec::text(
                    "csv_name",
                    "CSV file to load from (e.g., 'actuals.csv', 'budget.csv')",
                ),
                ParamSpec::json(
                    "filters",
                    "JSON string of column-value filters to apply. Example: '{\"month\": \"2023-01\", \"account_category\": \"Revenue\"}' or '{\"entity\": [\"Entity A\", \"Entity B\"]}' for multiple values",
                ),
            ],
            FinanceToolKind::CreateChart => vec![
                ParamSpec::json("data", "JSON string containing the dataframe data to visualize"),
                ParamSpec::text(
                    "chart_type",
                    "Type of chart: 'bar', 'line', 'pie', 'area', or 'scatter'",
                ),
                ParamSpec::text(
                    "x_column",
                    "Column name of dataframe data to use for the X-axis or categories",
                ),
                ParamSpec::text(
                    "y_column",
                    "Column name of dataframe data to use for the Y-axis or values",
                ),
            ],
        }
    }
}

/// One finance tool bound to its settings.
#[derive(Debug, Clone)]
pub struct FinanceTool {
    kind: FinanceToolKind,
    settings: Arc<FinanceSettings>,
}

impl FinanceTool {
    pub fn new(kind: FinanceToolKind, settings: Arc<FinanceSettings>) -> Self {
        Self { kind, settings }
    }

    pub fn kind(&self) -> FinanceToolKind {
        self.kind
    }

    fn explore(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let ExploreArgs { csv_name } = parse_args(args)?;
        let failed = |cause: String| {
            ToolError::ExecutionFailed(format!("Error exploring CSV '{}': {}", csv_name, cause))
        };

        let table =
            Table::load(&self.settings.fixtures_dir, &csv_name).map_err(|e| failed(e.to_string()))?;
        let summary = summarize(&csv_name, &table, self.settings.max_unique);
        serde_json::to_value(summary).map_err(|e| failed(e.to_string()))
    }

    fn extract(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let ExtractArgs { csv_name, filters } = parse_args(args)?;
        let failed = |cause: String| {
            ToolError::ExecutionFailed(format!(
                "Error extracting data from '{}': {}",
                csv_name, cause
            ))
        };

        let table =
            Table::load(&self.settings.fixtures_dir, &csv_name).map_err(|e| failed(e.to_string()))?;
        let filters = filters.decode("filters").map_err(failed)?;
        let extraction = apply_filters(&csv_name, &table, &filters).map_err(failed)?;

        debug!(csv_name = %csv_name, rows = extraction.row_count, "Extracted rows");
        serde_json::to_value(extraction).map_err(|e| failed(e.to_string()))
    }

    fn chart(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let ChartArgs {
            data,
            chart_type,
            x_column,
            y_column,
        } = parse_args(args)?;
        let failed =
            |cause: String| ToolError::ExecutionFailed(format!("Error creating chart: {}", cause));

        let data = data.decode("data").map_err(failed)?;
        let chart_type = chart_type.parse::<ChartType>().map_err(failed)?;
        let chart = build_chart(data, chart_type, &x_column, &y_column).map_err(failed)?;
        serde_json::to_value(chart).map_err(|e| failed(e.to_string()))
    }
}

#[async_trait]
impl Tool for FinanceTool {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        self.kind.parameters()
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        match self.kind {
            FinanceToolKind::ExploreCsv => self.explore(args),
            FinanceToolKind::ExtractCsvData => self.extract(args),
            FinanceToolKind::CreateChart => self.chart(args),
        }
    }
}

/// Builds a registry holding every finance tool.
pub fn finance_registry(settings: FinanceSettings) -> Result<ToolRegistry, ToolError> {
    let settings = Arc::new(settings);
    FinanceToolKind::ALL
        .into_iter()
        .fold(ToolRegistry::builder(), |builder, kind| {
            builder.register(FinanceTool::new(kind, settings.clone()))
        })
        .build()
}
