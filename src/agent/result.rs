use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tool::ToolExecutionResult;

/// One executed tool call, as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// The tool the model asked for
    pub tool: String,
    /// The arguments execution proceeded with
    pub arguments: Map<String, Value>,
    /// The normalized outcome
    pub result: ToolExecutionResult,
}

/// The terminal state an agent run ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The model produced a final answer
    Done,
    /// The model call failed
    Failed,
    /// The iteration bound was reached
    Exhausted,
}

/// The result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Final answer, or an explanation of why there is none
    pub answer: String,
    /// The latest successful chart configuration, if any
    pub chart_data: Option<Value>,
    /// Every tool call in execution order
    pub execution_log: Vec<ExecutionLogEntry>,
    /// Whether the model produced a final answer
    pub success: bool,
    /// Number of model calls made
    pub iterations: usize,
    /// How the run ended
    pub outcome: Outcome,
}

impl AgentResult {
    /// Returns the log entries whose tool failed.
    pub fn failed_tool_calls(&self) -> impl Iterator<Item = &ExecutionLogEntry> {
        self.execution_log.iter().filter(|entry| !entry.result.success)
    }
}
