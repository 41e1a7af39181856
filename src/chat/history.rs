//! Conversation history handling.
//!
//! History arrives with every request as `(question, answer)` pairs, oldest
//! first; nothing is stored server-side. Before it reaches any prompt the
//! history is trimmed to a window of recent pairs, and the trimmed-away
//! remainder can optionally be compressed into a single summary line with one
//! model call.

use std::sync::Arc;

use crate::chat::prompts::SUMMARIZE_INSTRUCTION;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};

const SUMMARIZE_TEMPERATURE: f64 = 0.1;

pub struct HistoryManager {
    window: usize,
    summarize_trimmed: bool,
}

impl HistoryManager {
    pub fn new(window: usize, summarize_trimmed: bool) -> Self {
        Self {
            window,
            summarize_trimmed,
        }
    }

    /// Splits history into (discarded, kept): the kept slice holds the most
    /// recent `window` pairs in their original order.
    pub fn trim<'a>(
        &self,
        pairs: &'a [(String, String)],
    ) -> (&'a [(String, String)], &'a [(String, String)]) {
        let cut = pairs.len().saturating_sub(self.window);
        pairs.split_at(cut)
    }

    /// Renders pairs as the labeled lines the prompt templates expect.
    pub fn render(pairs: &[(String, String)]) -> String {
        pairs
            .iter()
            .map(|(user, assistant)| format!("Human: {}\nAssistant: {}", user, assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Trims, optionally summarizes the discarded pairs, and renders the
    /// block that goes into `{chat_history}`.
    pub async fn prepare(
        &self,
        model: &Arc<dyn ChatModel>,
        pairs: &[(String, String)],
    ) -> String {
        let (discarded, kept) = self.trim(pairs);
        let rendered = Self::render(kept);

        if discarded.is_empty() || !self.summarize_trimmed {
            return rendered;
        }

        match summarize(model, discarded).await {
            Some(summary) if rendered.is_empty() => format!("System summary: {}", summary),
            Some(summary) => format!("System summary: {}\n{}", summary, rendered),
            None => rendered,
        }
    }
}

/// Best-effort: a failed summarization never sinks the main answer.
async fn summarize(model: &Arc<dyn ChatModel>, pairs: &[(String, String)]) -> Option<String> {
    let mut messages = Vec::with_capacity(pairs.len() * 2 + 1);
    for (user, assistant) in pairs {
        messages.push(ChatMessage::user(user.clone()));
        messages.push(ChatMessage::assistant(assistant.clone()));
    }
    messages.push(ChatMessage::user(SUMMARIZE_INSTRUCTION));

    let request = ChatRequest::new(messages).with_temperature(SUMMARIZE_TEMPERATURE);
    match model.complete(request).await {
        Ok(summary) => {
            let summary = summary.trim().to_string();
            (!summary.is_empty()).then_some(summary)
        }
        Err(err) => {
            tracing::warn!("history summarization failed, continuing without it: {}", err);
            None
        }
    }
}
