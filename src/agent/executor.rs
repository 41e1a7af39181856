//! Bounded think-act-observe loop.
//!
//! Each step is one completion call whose reply is parsed into a decision. A
//! final answer ends the loop; a tool call runs the tool and feeds the
//! observation back as a system message before the next step. Tool-level
//! failures (unknown name, timeout, tool error) become observations the model
//! can react to; only model-call failures and the step ceiling are fatal.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::{parse_agent_decision, tool_input, AgentDecision, AgentStep};
use crate::core::errors::ChatError;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_STEPS: usize = 6;
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AgentExecutor {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    max_steps: usize,
    tool_timeout: Duration,
}

#[derive(Debug)]
pub struct AgentOutcome {
    pub answer: String,
    pub steps: Vec<AgentStep>,
}

impl AgentExecutor {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            max_steps: DEFAULT_MAX_STEPS,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_tool_timeout(mut self, tool_timeout: Duration) -> Self {
        self.tool_timeout = tool_timeout;
        self
    }

    pub async fn run(
        &self,
        mut messages: Vec<ChatMessage>,
        temperature: f64,
    ) -> Result<AgentOutcome, ChatError> {
        let mut steps: Vec<AgentStep> = Vec::new();

        for step in 0..self.max_steps {
            let request = ChatRequest::new(messages.clone()).with_temperature(temperature);
            let reply = self.model.complete(request).await?;

            match parse_agent_decision(&reply) {
                AgentDecision::Final(answer) => {
                    tracing::debug!(
                        steps = steps.len(),
                        "agent produced a final answer at step {}/{}",
                        step + 1,
                        self.max_steps
                    );
                    return Ok(AgentOutcome { answer, steps });
                }
                AgentDecision::ToolCall { name, args } => {
                    let input = tool_input(&args);
                    tracing::debug!(
                        tool = %name,
                        "agent requested a tool (step {}/{})",
                        step + 1,
                        self.max_steps
                    );

                    let observation =
                        match self.tools.invoke(&name, &input, self.tool_timeout).await {
                            Ok(output) => format!("Tool `{}` result:\n{}", name, output),
                            Err(err) => {
                                tracing::warn!(tool = %name, "tool call failed: {}", err);
                                err.to_string()
                            }
                        };

                    // scratchpad: the decision and what came back, in order
                    messages.push(ChatMessage::assistant(reply));
                    messages.push(ChatMessage::system(observation.clone()));
                    steps.push(AgentStep {
                        tool_name: name,
                        tool_input: input,
                        observation,
                    });
                }
            }
        }

        Err(ChatError::MaxStepsExceeded(self.max_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use crate::tools::Tool;

    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ChatRequest) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ChatError::ModelCall("script exhausted".to_string()))
        }

        async fn stream_complete(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<String, ChatError>>, ChatError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    struct LookupTool;

    #[async_trait]
    impl Tool for LookupTool {
        fn name(&self) -> &'static str {
            "lookup"
        }

        fn description(&self) -> &'static str {
            "looks things up"
        }

        async fn invoke(&self, input: &str) -> Result<String, ChatError> {
            Ok(format!("found: {}", input))
        }
    }

    fn registry_with_lookup() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(LookupTool));
        registry
    }

    fn base_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("answer questions"),
            ChatMessage::user("what is the capital of France?"),
        ]
    }

    #[tokio::test]
    async fn immediate_final_answer_takes_one_step() {
        let model = ScriptedModel::new(&[r#"{"type":"final","content":"Paris."}"#]);
        let executor = AgentExecutor::new(model, registry_with_lookup());

        let outcome = executor.run(base_messages(), 0.3).await.unwrap();
        assert_eq!(outcome.answer, "Paris.");
        assert!(outcome.steps.is_empty());
    }

    #[tokio::test]
    async fn tool_result_is_fed_back_before_the_final_answer() {
        let model = ScriptedModel::new(&[
            r#"{"type":"tool_call","tool_name":"lookup","tool_args":{"input":"capital of France"}}"#,
            r#"{"type":"final","content":"Paris, per the lookup."}"#,
        ]);
        let executor = AgentExecutor::new(model.clone(), registry_with_lookup());

        let outcome = executor.run(base_messages(), 0.3).await.unwrap();
        assert_eq!(outcome.answer, "Paris, per the lookup.");
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.steps[0].tool_name, "lookup");
        assert_eq!(outcome.steps[0].tool_input, "capital of France");
        assert!(outcome.steps[0].observation.contains("found: capital of France"));

        // second completion saw the decision and its observation, in order
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let last = &seen[1].messages;
        let n = last.len();
        assert_eq!(last[n - 2].role, "assistant");
        assert!(last[n - 2].content.contains("tool_call"));
        assert_eq!(last[n - 1].role, "system");
        assert!(last[n - 1].content.contains("Tool `lookup` result:"));
    }

    #[tokio::test]
    async fn unregistered_tool_becomes_an_observation_not_a_crash() {
        let model = ScriptedModel::new(&[
            r#"{"type":"tool_call","tool_name":"X","tool_args":{"input":"anything"}}"#,
            r#"{"type":"final","content":"answered without the tool"}"#,
        ]);
        let executor = AgentExecutor::new(model.clone(), registry_with_lookup());

        let outcome = executor.run(base_messages(), 0.3).await.unwrap();
        assert_eq!(outcome.answer, "answered without the tool");
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.steps[0].observation, "unknown tool: X");

        let seen = model.seen.lock().unwrap();
        assert!(seen[1]
            .messages
            .iter()
            .any(|m| m.role == "system" && m.content.contains("unknown tool: X")));
    }

    #[tokio::test]
    async fn step_ceiling_is_a_hard_error() {
        // never produces a final answer
        let model = ScriptedModel::new(&[
            r#"{"type":"tool_call","tool_name":"lookup","tool_args":{"input":"a"}}"#,
            r#"{"type":"tool_call","tool_name":"lookup","tool_args":{"input":"b"}}"#,
            r#"{"type":"tool_call","tool_name":"lookup","tool_args":{"input":"c"}}"#,
        ]);
        let executor = AgentExecutor::new(model, registry_with_lookup()).with_max_steps(2);

        let err = executor.run(base_messages(), 0.3).await.unwrap_err();
        assert!(matches!(err, ChatError::MaxStepsExceeded(2)));
    }

    #[tokio::test]
    async fn model_failure_is_fatal() {
        let model = ScriptedModel::new(&[]);
        let executor = AgentExecutor::new(model, registry_with_lookup());

        let err = executor.run(base_messages(), 0.3).await.unwrap_err();
        assert!(matches!(err, ChatError::ModelCall(_)));
    }
}
