//! Finance Agent CLI
//!
//! Answers one question about the CSV files in a fixtures directory and prints
//! the answer, the tool calls that produced it and the chart payload, if any.
//!
//! ```bash
//! export GROQ_API_KEY="your-api-key"
//! finance-agent --fixtures fixtures "How did revenue compare to budget in 2023?"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use finance_agent::agent::{Agent, AgentConfig, AgentEvent, AgentResult};
use finance_agent::finance::{FinanceSettings, finance_registry};
use finance_agent::llm::{GROQ_BASE_URL, LLMClientBuilder};

#[derive(Debug, Parser)]
#[command(name = "finance-agent", version, about = "Ask questions about financial CSV data")]
struct Cli {
    /// The question to answer
    #[arg(required_unless_present = "list_tools")]
    question: Option<String>,

    /// Directory holding the CSV files
    #[arg(long, default_value = "fixtures")]
    fixtures: PathBuf,

    /// Model name sent to the API
    #[arg(long, default_value = "openai/gpt-oss-20b")]
    model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = GROQ_BASE_URL)]
    base_url: String,

    /// API key for the model provider
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum number of model calls
    #[arg(long, default_value_t = 15)]
    max_iterations: usize,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Maximum tokens per model reply
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Print the whole result as JSON
    #[arg(long)]
    json: bool,

    /// Print the available tools and exit
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            std::process::exit(2);
        }
    }
}

/// Runs the CLI; returns whether the question was answered.
async fn run(cli: Cli) -> Result<bool> {
    let registry = finance_registry(FinanceSettings::new(&cli.fixtures))
        .context("failed to build the finance tools")?;

    if cli.list_tools {
        println!("{}", registry.describe());
        return Ok(true);
    }

    let question = cli.question.context("a question is required")?;

    let llm_client = LLMClientBuilder::new()
        .with_api_key(cli.api_key.unwrap_or_default())
        .with_base_url(cli.base_url)
        .build_openai()
        .context("failed to create the model client (is GROQ_API_KEY set?)")?;

    let config = AgentConfig {
        model: cli.model,
        max_iterations: cli.max_iterations,
        max_tokens: cli.max_tokens,
        temperature: cli.temperature,
        ..AgentConfig::default()
    };
    debug!(?config, fixtures = %cli.fixtures.display(), "Starting agent");

    let agent = Agent::new(llm_client, Arc::new(registry), config);
    let result = agent.run_with_observer(&question, &mut report_progress).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result)?;
    }

    Ok(result.success)
}

fn report_progress(event: &AgentEvent) {
    match event {
        AgentEvent::IterationStarted { iteration } => eprintln!("[iteration {}]", iteration),
        AgentEvent::ToolCallStarted { name, arguments, .. } => {
            eprintln!("  -> {} {}", name, serde_json::Value::Object(arguments.clone()))
        }
        AgentEvent::ToolCallFinished { name, success, .. } => {
            let status = if *success { "ok" } else { "failed" };
            eprintln!("  <- {} {}", name, status)
        }
        AgentEvent::Finished { .. } => {}
    }
}

fn print_result(result: &AgentResult) -> Result<()> {
    println!("{}", result.answer);

    if !result.execution_log.is_empty() {
        println!("\n=== Tool Calls ({} iterations) ===", result.iterations);
        for (idx, entry) in result.execution_log.iter().enumerate() {
            match &entry.result.error {
                None => println!("{}. {}", idx + 1, entry.tool),
                Some(error) => println!("{}. {} (failed: {})", idx + 1, entry.tool, error),
            }
        }
    }

    if let Some(chart) = &result.chart_data {
        println!("\n=== Chart ===");
        println!("{}", serde_json::to_string_pretty(chart)?);
    }

    Ok(())
}
