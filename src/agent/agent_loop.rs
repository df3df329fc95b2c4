use std::sync::Arc;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::{Instrument, debug, info, info_span, warn};

use super::prompt::{DataSource, default_data_sources, financial_analyst_prompt};
use super::result::{AgentResult, ExecutionLogEntry, Outcome};
use crate::conversation::{Conversation, Message, ToolCallRequest};
use crate::llm::{LLMClient, LLMError, LLMInput, ToolChoice};
use crate::tool::ToolRegistry;

/// Answer returned when the iteration bound is reached.
pub const EXHAUSTED_ANSWER: &str = "Could not complete analysis within iteration limit";

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The model to use
    pub model: String,
    /// Fixed system prompt; when absent the analyst prompt is rendered per run
    pub system_prompt: Option<String>,
    /// Data sources listed in the rendered analyst prompt
    pub data_sources: Vec<DataSource>,
    /// Maximum number of model calls per question
    pub max_iterations: usize,
    /// Maximum tokens to generate per model call
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Tool selection mode sent with every request
    pub tool_choice: ToolChoice,
    /// Tool whose latest successful result becomes the chart payload
    pub chart_tool: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-oss-20b".to_string(),
            system_prompt: None,
            data_sources: default_data_sources(),
            max_iterations: 15,
            max_tokens: 4096,
            temperature: 0.7,
            tool_choice: ToolChoice::Auto,
            chart_tool: "create_chart".to_string(),
        }
    }
}

/// Progress events emitted while a question is being answered.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A model call is about to be made
    IterationStarted {
        iteration: usize,
    },
    /// A tool call requested by the model is about to run
    ToolCallStarted {
        id: String,
        name: String,
        arguments: Map<String, Value>,
    },
    /// A tool call finished
    ToolCallFinished {
        id: String,
        name: String,
        success: bool,
    },
    /// The run reached a terminal state
    Finished {
        outcome: Outcome,
        iterations: usize,
    },
}

/// Terminal states of the loop.
enum LoopState {
    Done(String),
    Failed(LLMError),
    Exhausted,
}

/// The agent that answers questions by alternating model calls and tool calls.
///
/// An agent holds no conversation state: every call to [`Agent::run`] starts a
/// fresh conversation and execution log, so one agent can serve many
/// questions, one at a time or from independent tasks.
#[derive(Clone)]
pub struct Agent {
    llm_client: Arc<dyn LLMClient>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Creates a new agent.
    pub fn new(
        llm_client: Arc<dyn LLMClient>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            llm_client,
            registry,
            config,
        }
    }

    /// Creates a new agent with default configuration.
    pub fn with_defaults(llm_client: Arc<dyn LLMClient>, registry: Arc<ToolRegistry>) -> Self {
        Self::new(llm_client, registry, AgentConfig::default())
    }

    /// Returns the agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the tools available to the model.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answers a question.
    pub async fn run(&self, user_query: &str) -> AgentResult {
        self.run_with_observer(user_query, &mut |_| {}).await
    }

    /// Answers a question, reporting progress to `observer`.
    ///
    /// Never fails: model errors, tool errors and exhaustion of the iteration
    /// bound are all reported through the returned [`AgentResult`].
    pub async fn run_with_observer(
        &self,
        user_query: &str,
        observer: &mut (dyn FnMut(&AgentEvent) + Send),
    ) -> AgentResult {
        let conversation = Conversation::new(&self.system_prompt(), user_query);
        let span = info_span!(
            "agent_run",
            run_id = %conversation.id(),
            model = %self.config.model
        );

        self.run_loop(conversation, observer).instrument(span).await
    }

    fn system_prompt(&self) -> String {
        match &self.config.system_prompt {
            Some(prompt) => prompt.clone(),
            None => financial_analyst_prompt(&Local::now(), &self.config.data_sources),
        }
    }

    /// Runs the loop until the model answers, fails, or the bound is reached.
    async fn run_loop(
        &self,
        mut conversation: Conversation,
        observer: &mut (dyn FnMut(&AgentEvent) + Send),
    ) -> AgentResult {
        let tools = self.registry.tool_schemas();
        let mut execution_log: Vec<ExecutionLogEntry> = Vec::new();
        let mut iteration = 0;

        let state = loop {
            if iteration >= self.config.max_iterations {
                warn!(iteration, "Iteration limit reached");
                break LoopState::Exhausted;
            }
            iteration += 1;
            observer(&AgentEvent::IterationStarted { iteration });

            let input = LLMInput {
                model: self.config.model.clone(),
                messages: conversation.messages().to_vec(),
                tools: tools.clone(),
                tool_choice: self.config.tool_choice,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            debug!(iteration, messages = input.messages.len(), "Calling LLM");

            let response = match self.llm_client.complete(input).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(iteration, %error, "LLM call failed");
                    break LoopState::Failed(error);
                }
            };

            // The reply is kept in both branches so the next call sees it.
            conversation.push(response.to_message());

            if response.tool_calls.is_empty() {
                break LoopState::Done(response.content.unwrap_or_default());
            }

            debug!(iteration, count = response.tool_calls.len(), "Executing tool calls");

            for call in &response.tool_calls {
                let entry = self.execute_call(call, &mut conversation, observer).await;
                execution_log.push(entry);
            }
        };

        let result = self.finish(state, iteration, execution_log);
        observer(&AgentEvent::Finished {
            outcome: result.outcome,
            iterations: result.iterations,
        });
        result
    }

    /// Executes one tool call and appends its result to the conversation.
    async fn execute_call(
        &self,
        call: &ToolCallRequest,
        conversation: &mut Conversation,
        observer: &mut (dyn FnMut(&AgentEvent) + Send),
    ) -> ExecutionLogEntry {
        let arguments = parse_arguments(&call.name, &call.arguments);

        observer(&AgentEvent::ToolCallStarted {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: arguments.clone(),
        });

        let result = self.registry.execute(&call.name, &arguments).await;

        if result.success {
            info!(tool = %call.name, "Tool succeeded");
        } else {
            info!(tool = %call.name, error = ?result.error, "Tool failed");
        }

        observer(&AgentEvent::ToolCallFinished {
            id: call.id.clone(),
            name: call.name.clone(),
            success: result.success,
        });

        conversation.push(Message::tool_result(
            call.id.clone(),
            call.name.clone(),
            result.to_content(),
        ));

        ExecutionLogEntry {
            tool: call.name.clone(),
            arguments,
            result,
        }
    }

    /// Assembles the caller-facing result for a terminal state.
    fn finish(
        &self,
        state: LoopState,
        iteration: usize,
        execution_log: Vec<ExecutionLogEntry>,
    ) -> AgentResult {
        match state {
            LoopState::Done(answer) => {
                let chart_data = latest_chart(&execution_log, &self.config.chart_tool);
                info!(
                    iterations = iteration,
                    tool_calls = execution_log.len(),
                    has_chart = chart_data.is_some(),
                    "Final answer produced"
                );
                AgentResult {
                    answer,
                    chart_data,
                    execution_log,
                    success: true,
                    iterations: iteration,
                    outcome: Outcome::Done,
                }
            }
            LoopState::Failed(error) => AgentResult {
                answer: format!("Error occurred during processing: {}", error),
                chart_data: None,
                execution_log,
                success: false,
                iterations: iteration,
                outcome: Outcome::Failed,
            },
            LoopState::Exhausted => AgentResult {
                answer: EXHAUSTED_ANSWER.to_string(),
                chart_data: None,
                execution_log,
                success: false,
                iterations: self.config.max_iterations,
                outcome: Outcome::Exhausted,
            },
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// Decodes the model's argument string into keyword arguments.
///
/// Anything that is not a JSON object becomes an empty map so the call still
/// runs and the tool reports what is missing.
fn parse_arguments(tool: &str, raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(arguments) => arguments,
        Err(error) => {
            warn!(tool, %error, "Could not parse tool arguments");
            Map::new()
        }
    }
}

/// Returns the result of the most recent successful call to `chart_tool`.
fn latest_chart(log: &[ExecutionLogEntry], chart_tool: &str) -> Option<Value> {
    log.iter()
        .rev()
        .find(|entry| entry.tool == chart_tool && entry.result.success)
        .and_then(|entry| entry.result.result.clone())
}
