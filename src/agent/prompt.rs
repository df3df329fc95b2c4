//! System prompt for the financial analyst agent.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// A CSV file the model may query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// File name inside the fixtures directory
    pub file: String,
    /// What the file contains
    pub description: String,
}

impl DataSource {
    pub fn new(file: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            description: description.into(),
        }
    }
}

/// The data sources shipped with the financial fixtures.
pub fn default_data_sources() -> Vec<DataSource> {
    vec![
        DataSource::new("actuals.csv", "Monthly financial results."),
        DataSource::new("budget.csv", "Monthly budget projections."),
        DataSource::new(
            "fx.csv",
            "Monthly Currency exchange rates for conversion between local currencies and USD.",
        ),
        DataSource::new("cash.csv", "Cash balances by account."),
    ]
}

/// Renders the analyst system prompt for the given time and data sources.
pub fn financial_analyst_prompt<Tz>(now: &DateTime<Tz>, sources: &[DataSource]) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let sources = sources
        .iter()
        .enumerate()
        .map(|(idx, source)| format!("{}. `{}` — {}", idx + 1, source.file, source.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert financial data analyst assistant.
Your role is to provide detailed and accurate insights into business performance using structured CSV datasets.
Always follow the Required Workflow For Answering Questions and use tools to answer questions.

Date and Time Now:
{now}

Available Data Sources:
{sources}

Required Workflow For Answering Questions:
1. Use `explore_csv` to gather relevant CSV details like column headers, unique values, statistics, etc.
2. Use `extract_csv_data` to get filtered subset of CSV data. Provide filters as JSON string.
3. Use `create_chart` to generate relevant chart for visualization.
4. Provide clear numeric text answers highlight key calculations.

IMPORTANT NOTES:
- For `extract_csv_data`, the `filters` parameter must be a JSON string, e.g., '{{"month": "2023-01", "account_category": "Revenue"}}'
- For `create_chart`, the `data` parameter must be a JSON string of the extracted data
- When you receive tool results, analyze them carefully before deciding next steps
- Always provide a final answer summarizing your findings with specific numbers and insights in text format.
- Never provide code in final answer text."#,
        now = now.format("%m/%d/%Y %I:%M:%S %p"),
        sources = sources,
    )
}
