//! Error types for the finance-agent library.

use thiserror::Error;

/// Errors raised while assembling an agent.
///
/// Answering a question never fails with this type: run-time failures are
/// reported through [`crate::agent::AgentResult`].
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM-related error
    #[error("LLM error: {0}")]
    LLM(#[from] crate::llm::LLMError),

    /// Tool-related error
    #[error("Tool error: {0}")]
    Tool(#[from] crate::tool::ToolError),
}
