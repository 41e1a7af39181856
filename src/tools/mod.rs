//! Agent tools.
//!
//! Tools take a plain-text input and return a plain-text observation. They
//! are registered once at startup; the agent loop resolves them by name at
//! run time, so adding a tool never touches the loop itself.

pub mod calculator;
pub mod encyclopedia;
pub mod search;

pub use calculator::CalculatorTool;
pub use encyclopedia::EncyclopediaTool;
pub use search::SearchTool;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::errors::ChatError;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn invoke(&self, input: &str) -> Result<String, ChatError>;
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// One `name: description` line per tool, for the `{tools}` placeholder.
    pub fn render_descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Looks up and runs a tool under its own deadline. Unknown names and
    /// failures come back as errors for the caller to absorb; they are never
    /// fatal to the turn by themselves.
    pub async fn invoke(
        &self,
        name: &str,
        input: &str,
        timeout: Duration,
    ) -> Result<String, ChatError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ChatError::UnknownTool(name.to_string()))?;

        match tokio::time::timeout(timeout, tool.invoke(input)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err @ ChatError::ToolFailed { .. })) => Err(err),
            Ok(Err(err)) => Err(ChatError::ToolFailed {
                name: name.to_string(),
                message: err.to_string(),
            }),
            Err(_) => Err(ChatError::ToolFailed {
                name: name.to_string(),
                message: format!("timed out after {}s", timeout.as_secs()),
            }),
        }
    }
}
