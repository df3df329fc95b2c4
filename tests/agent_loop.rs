use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::{Sequence, mock};
use serde_json::{Map, Value, json};

use finance_agent::agent::{Agent, AgentConfig, AgentEvent, EXHAUSTED_ANSWER, Outcome};
use finance_agent::conversation::{Message, MessageRole, ToolCallRequest};
use finance_agent::llm::{LLMClient, LLMError, LLMInput, LLMOutput};
use finance_agent::tool::{ParamSpec, Tool, ToolError, ToolRegistry};

mock! {
    pub Llm {}

    #[async_trait]
    impl LLMClient for Llm {
        async fn complete(&self, input: LLMInput) -> Result<LLMOutput, LLMError>;
    }
}

/// A tool that records every call and replies with a fixed outcome.
struct StubTool {
    name: &'static str,
    reply: Result<Value, String>,
    calls: Arc<Mutex<Vec<Map<String, Value>>>>,
}

impl StubTool {
    fn ok(name: &'static str, value: Value) -> Self {
        Self {
            name,
            reply: Ok(value),
            calls: Arc::default(),
        }
    }

    fn failing(name: &'static str, error: &str) -> Self {
        Self {
            name,
            reply: Err(error.to_string()),
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Stub tool"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::text("csv_name", "Name of the CSV file")]
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(args);
        self.reply.clone().map_err(ToolError::ExecutionFailed)
    }
}

/// A chart tool echoing its `title` argument.
struct EchoChartTool;

#[async_trait]
impl Tool for EchoChartTool {
    fn name(&self) -> &str {
        "create_chart"
    }

    fn description(&self) -> &str {
        "Prepare chart configuration"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::text("title", "Chart title")]
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        match args.get("title") {
            Some(title) => Ok(json!({ "title": title })),
            None => Err(ToolError::InvalidArguments("missing title".to_string())),
        }
    }
}

fn call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest::new(id, name, arguments)
}

fn config(max_iterations: usize) -> AgentConfig {
    AgentConfig {
        model: "test-model".to_string(),
        system_prompt: Some("You are a financial analyst.".to_string()),
        max_iterations,
        ..AgentConfig::default()
    }
}

fn agent(llm: MockLlm, registry: ToolRegistry, max_iterations: usize) -> Agent {
    Agent::new(Arc::new(llm), Arc::new(registry), config(max_iterations))
}

#[tokio::test]
async fn test_explore_then_answer() {
    let explore = StubTool::ok("explore_csv", json!({"num_rows": 3}));
    let calls = explore.calls.clone();
    let registry = ToolRegistry::builder().register(explore).build().unwrap();

    let mut llm = MockLlm::new();
    let mut seq = Sequence::new();
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|input| input.messages.len() == 2 && input.tools.len() == 1)
        .returning(|_| {
            Ok(LLMOutput::tool_calls(vec![call(
                "call_1",
                "explore_csv",
                r#"{"csv_name": "actuals.csv"}"#,
            )]))
        });
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|input| input.messages.len() == 4)
        .returning(|_| Ok(LLMOutput::text("Revenue was 100.")));

    let result = agent(llm, registry, 15).run("What was revenue?").await;

    assert!(result.success);
    assert_eq!(result.outcome, Outcome::Done);
    assert_eq!(result.answer, "Revenue was 100.");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.chart_data, None);
    assert_eq!(result.execution_log.len(), 1);
    assert_eq!(result.execution_log[0].tool, "explore_csv");
    assert_eq!(result.execution_log[0].arguments["csv_name"], json!("actuals.csv"));
    assert!(result.execution_log[0].result.success);
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_model_failure_on_first_call() {
    let registry = ToolRegistry::builder()
        .register(StubTool::ok("explore_csv", json!({})))
        .build()
        .unwrap();

    let mut llm = MockLlm::new();
    llm.expect_complete()
        .times(1)
        .returning(|_| Err(LLMError::ApiError("API connection timeout".to_string())));

    let result = agent(llm, registry, 15).run("What was revenue?").await;

    assert!(!result.success);
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.iterations, 1);
    assert!(result.execution_log.is_empty());
    assert_eq!(result.chart_data, None);
    assert!(result.answer.starts_with("Error occurred during processing: "));
    assert!(result.answer.contains("API connection timeout"));
}

#[tokio::test]
async fn test_tool_failure_is_fed_back() {
    let registry = ToolRegistry::builder()
        .register(StubTool::failing(
            "explore_csv",
            "CSV file not found: nonexistent.csv",
        ))
        .build()
        .unwrap();

    let mut llm = MockLlm::new();
    let mut seq = Sequence::new();
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(LLMOutput::tool_calls(vec![call(
                "call_1",
                "explore_csv",
                r#"{"csv_name": "nonexistent.csv"}"#,
            )]))
        });
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|input| match input.messages.last() {
            Some(Message::Tool {
                tool_call_id,
                content,
                ..
            }) => tool_call_id == "call_1" && content.contains("CSV file not found: nonexistent.csv"),
            _ => false,
        })
        .returning(|_| Ok(LLMOutput::text("The file does not exist.")));

    let result = agent(llm, registry, 15).run("Explore nonexistent.csv").await;

    assert!(result.success);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.execution_log.len(), 1);

    let entry = &result.execution_log[0].result;
    assert!(!entry.success);
    assert_eq!(entry.error.as_deref(), Some("CSV file not found: nonexistent.csv"));
    assert_eq!(entry.tool.as_deref(), Some("explore_csv"));
}

#[tokio::test]
async fn test_iteration_limit_is_reported() {
    let explore = StubTool::ok("explore_csv", json!({"num_rows": 3}));
    let calls = explore.calls.clone();
    let registry = ToolRegistry::builder().register(explore).build().unwrap();

    let mut llm = MockLlm::new();
    llm.expect_complete().times(15).returning(|_| {
        Ok(LLMOutput::tool_calls(vec![call(
            "call_n",
            "explore_csv",
            r#"{"csv_name": "actuals.csv"}"#,
        )]))
    });

    let result = agent(llm, registry, 15).run("Keep exploring").await;

    assert!(!result.success);
    assert_eq!(result.outcome, Outcome::Exhausted);
    assert_eq!(result.answer, EXHAUSTED_ANSWER);
    assert_eq!(result.iterations, 15);
    assert_eq!(result.execution_log.len(), 15);
    assert_eq!(result.chart_data, None);
    assert_eq!(calls.lock().unwrap().len(), 15);
}

#[tokio::test]
async fn test_zero_iterations_makes_no_call() {
    let registry = ToolRegistry::builder().build().unwrap();

    let mut llm = MockLlm::new();
    llm.expect_complete().times(0);

    let result = agent(llm, registry, 0).run("Anything").await;

    assert_eq!(result.outcome, Outcome::Exhausted);
    assert_eq!(result.iterations, 0);
    assert!(result.execution_log.is_empty());
}

#[tokio::test]
async fn test_malformed_arguments_still_execute() {
    let explore = StubTool::ok("explore_csv", json!({"num_rows": 3}));
    let calls = explore.calls.clone();
    let registry = ToolRegistry::builder().register(explore).build().unwrap();

    let mut llm = MockLlm::new();
    let mut seq = Sequence::new();
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(LLMOutput::tool_calls(vec![call(
                "call_1",
                "explore_csv",
                "not valid json {{",
            )]))
        });
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(LLMOutput::text("done")));

    let result = agent(llm, registry, 15).run("Explore").await;

    assert!(result.success);
    assert_eq!(result.execution_log.len(), 1);
    assert!(result.execution_log[0].arguments.is_empty());
    assert_eq!(calls.lock().unwrap().as_slice(), &[Map::new()]);
}

#[tokio::test]
async fn test_tool_calls_run_in_request_order() {
    let registry = ToolRegistry::builder()
        .register(StubTool::ok("explore_csv", json!({"file": "explored"})))
        .register(StubTool::ok("extract_csv_data", json!({"row_count": 2})))
        .build()
        .unwrap();

    let mut llm = MockLlm::new();
    let mut seq = Sequence::new();
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(LLMOutput::tool_calls(vec![
                call("call_1", "extract_csv_data", r#"{"csv_name": "budget.csv"}"#),
                call("call_2", "explore_csv", r#"{"csv_name": "actuals.csv"}"#),
                call("call_3", "missing_tool", "{}"),
            ]))
        });
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|input| {
            let roles: Vec<MessageRole> = input.messages.iter().map(Message::role).collect();
            let tool_ids: Vec<&str> = input
                .messages
                .iter()
                .filter_map(|message| match message {
                    Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                    _ => None,
                })
                .collect();

            roles
                == vec![
                    MessageRole::System,
                    MessageRole::User,
                    MessageRole::Assistant,
                    MessageRole::Tool,
                    MessageRole::Tool,
                    MessageRole::Tool,
                ]
                && tool_ids == vec!["call_1", "call_2", "call_3"]
                && input.messages[2].tool_calls().len() == 3
        })
        .returning(|_| Ok(LLMOutput::text("Budget and actuals compared.")));

    let result = agent(llm, registry, 15).run("Compare").await;

    let tools: Vec<&str> = result.execution_log.iter().map(|e| e.tool.as_str()).collect();
    assert_eq!(tools, vec!["extract_csv_data", "explore_csv", "missing_tool"]);
    assert_eq!(result.iterations, 2);

    let unknown = &result.execution_log[2].result;
    assert!(!unknown.success);
    assert!(unknown.error.as_deref().unwrap().contains("Tool 'missing_tool' not found"));
    assert_eq!(result.failed_tool_calls().count(), 1);
}

#[tokio::test]
async fn test_latest_successful_chart_is_returned() {
    let registry = ToolRegistry::builder().register(EchoChartTool).build().unwrap();

    let mut llm = MockLlm::new();
    let mut seq = Sequence::new();
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(LLMOutput::tool_calls(vec![
                call("call_1", "create_chart", r#"{"title": "first"}"#),
                call("call_2", "create_chart", r#"{"title": "second"}"#),
            ]))
        });
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(LLMOutput::tool_calls(vec![call("call_3", "create_chart", "{}")])));
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(LLMOutput::text("Charted.")));

    let result = agent(llm, registry, 15).run("Chart it").await;

    assert!(result.success);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.execution_log.len(), 3);
    assert_eq!(result.chart_data, Some(json!({"title": "second"})));
}

#[tokio::test]
async fn test_observer_sees_every_step() {
    let registry = ToolRegistry::builder()
        .register(StubTool::ok("explore_csv", json!({})))
        .build()
        .unwrap();

    let mut llm = MockLlm::new();
    let mut seq = Sequence::new();
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(LLMOutput::tool_calls(vec![call(
                "call_1",
                "explore_csv",
                r#"{"csv_name": "fx.csv"}"#,
            )]))
        });
    llm.expect_complete()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(LLMOutput::text("done")));

    let mut events = Vec::new();
    let result = agent(llm, registry, 15)
        .run_with_observer("Explore fx", &mut |event: &AgentEvent| events.push(event.clone()))
        .await;

    let mut arguments = Map::new();
    arguments.insert("csv_name".to_string(), json!("fx.csv"));

    assert!(result.success);
    assert_eq!(
        events,
        vec![
            AgentEvent::IterationStarted { iteration: 1 },
            AgentEvent::ToolCallStarted {
                id: "call_1".to_string(),
                name: "explore_csv".to_string(),
                arguments,
            },
            AgentEvent::ToolCallFinished {
                id: "call_1".to_string(),
                name: "explore_csv".to_string(),
                success: true,
            },
            AgentEvent::IterationStarted { iteration: 2 },
            AgentEvent::Finished {
                outcome: Outcome::Done,
                iterations: 2,
            },
        ]
    );
}

#[tokio::test]
async fn test_each_run_starts_fresh() {
    let registry = ToolRegistry::builder().build().unwrap();

    let mut llm = MockLlm::new();
    llm.expect_complete()
        .times(2)
        .withf(|input| input.messages.len() == 2 && input.model == "test-model")
        .returning(|_| Ok(LLMOutput::text("answer")));

    let agent = agent(llm, registry, 15);
    let first = agent.run("First question").await;
    let second = agent.run("Second question").await;

    assert_eq!(first, second);
    assert_eq!(second.iterations, 1);
}
