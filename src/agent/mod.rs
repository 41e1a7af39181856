//! Tool-using agent: the decision protocol the model replies in, and the
//! step loop that executes it.
//!
//! The model is instructed to answer with a single JSON object, either a tool
//! call or a final answer. Replies are parsed leniently: fenced or
//! prose-wrapped JSON is extracted, common alternate key names are accepted,
//! and anything that still fails to parse is treated as a final answer in
//! plain text rather than rejected.

pub mod executor;

pub use executor::{AgentExecutor, AgentOutcome};

use serde_json::Value;

#[derive(Debug, Clone)]
pub enum AgentDecision {
    Final(String),
    ToolCall { name: String, args: Value },
}

/// One executed tool call, kept for logging alongside the final answer.
#[derive(Debug, Clone)]
pub struct AgentStep {
    pub tool_name: String,
    pub tool_input: String,
    pub observation: String,
}

pub fn parse_agent_decision(text: &str) -> AgentDecision {
    extract_json(text)
        .as_ref()
        .and_then(decision_from)
        .unwrap_or_else(|| AgentDecision::Final(text.trim().to_string()))
}

/// The whole reply when it parses as JSON, otherwise the outermost `{…}`
/// span (fenced or prose-wrapped replies).
fn extract_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Key names vary between models; each field accepts the aliases seen in
/// practice.
fn decision_from(value: &Value) -> Option<AgentDecision> {
    match string_field(value, &["type", "action"])? {
        "tool_call" => Some(AgentDecision::ToolCall {
            name: string_field(value, &["tool_name", "name", "tool"])?.to_string(),
            args: ["tool_args", "args"]
                .into_iter()
                .find_map(|key| value.get(key))
                .cloned()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        }),
        "final" => Some(AgentDecision::Final(
            string_field(value, &["content", "message", "response"])
                .unwrap_or_default()
                .to_string(),
        )),
        _ => None,
    }
}

fn string_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| value.get(key)?.as_str())
}

/// Flattens tool args to the plain-text input tools take. String args pass
/// through; objects yield their conventional text field or, failing that,
/// their JSON serialization.
pub fn tool_input(args: &Value) -> String {
    if let Some(text) = args.as_str() {
        return text.to_string();
    }
    for key in ["input", "query", "expression"] {
        if let Some(text) = args.get(key).and_then(|v| v.as_str()) {
            return text.to_string();
        }
    }
    if args.is_null() {
        return String::new();
    }
    args.to_string()
}
