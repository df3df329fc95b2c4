pub mod agent_loop;
pub mod prompt;
pub mod result;

use std::sync::Arc;

pub use agent_loop::{Agent, AgentConfig, AgentEvent, EXHAUSTED_ANSWER};
pub use prompt::{DataSource, default_data_sources, financial_analyst_prompt};
pub use result::{AgentResult, ExecutionLogEntry, Outcome};

use crate::error::AgentError;
use crate::finance::{FinanceSettings, finance_registry};
use crate::llm::LLMClientBuilder;

/// Builds an agent wired to an OpenAI-compatible endpoint and the finance tools.
///
/// Fails before any request is made when the client has no API key or the
/// tool set is invalid.
pub fn build_financial_agent(
    client: LLMClientBuilder,
    settings: FinanceSettings,
    config: AgentConfig,
) -> Result<Agent, AgentError> {
    let llm_client = client.build_openai()?;
    let registry = finance_registry(settings)?;

    Ok(Agent::new(llm_client, Arc::new(registry), config))
}
