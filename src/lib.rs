//! # Finance Agent
//!
//! A tool-calling agent that answers natural-language questions about
//! financial CSV data by letting a chat model explore, filter and chart it.
//!
//! ## Features
//!
//! - **Agent Loop**: Bounded alternation of model calls and tool calls
//! - **Tool System**: A trait for tools plus a registry that never lets a tool failure escape
//! - **Finance Tools**: `explore_csv`, `extract_csv_data` and `create_chart`
//! - **OpenAI-compatible Client**: Works against Groq or any chat completions endpoint
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finance_agent::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("GROQ_API_KEY")?;
//!
//!     let agent = build_financial_agent(
//!         LLMClientBuilder::new().with_api_key(api_key),
//!         FinanceSettings::new("fixtures"),
//!         AgentConfig::default(),
//!     )?;
//!
//!     let result = agent.run("What was the revenue in January 2023?").await;
//!     println!("{}", result.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod conversation;
pub mod error;
pub mod finance;
pub mod llm;
pub mod tool;

// Re-exports for convenient usage
pub use agent::{
    Agent, AgentConfig, AgentEvent, AgentResult, ExecutionLogEntry, Outcome,
    build_financial_agent,
};
pub use conversation::{Conversation, Message, MessageRole, ToolCallRequest};
pub use error::AgentError;
pub use finance::{FinanceSettings, finance_registry};
pub use llm::{LLMClient, LLMClientBuilder, LLMError, LLMInput, LLMOutput, OpenAIClient, ToolChoice};
pub use tool::{
    DynTool, ParamSpec, Tool, ToolError, ToolExecutionResult, ToolRegistry, ToolSchema,
};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::agent::{Agent, AgentConfig, AgentResult, Outcome, build_financial_agent};
    pub use crate::finance::{FinanceSettings, finance_registry};
    pub use crate::llm::{LLMClient, LLMClientBuilder, OpenAIClient};
    pub use crate::tool::{DynTool, ParamSpec, Tool, ToolError, ToolExecutionResult, ToolRegistry};
}
