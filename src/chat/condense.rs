//! Question rewriting.
//!
//! Follow-up questions lean on the conversation ("how big is it?"), so before
//! retrieval the question is rewritten into a standalone one using the recent
//! history. The rewrite runs unconditionally, even with empty history: the
//! model then acts as a normalization pass on the raw question.

use std::sync::Arc;

use crate::chat::prompt::PromptTemplate;
use crate::core::errors::ChatError;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};

/// Strips surrounding whitespace and flattens newlines so the question is a
/// single line by the time it reaches any prompt.
pub fn sanitize_question(raw: &str) -> String {
    raw.trim().replace('\n', " ")
}

pub async fn condense_question(
    model: &Arc<dyn ChatModel>,
    template: &PromptTemplate,
    question: &str,
    chat_history: &str,
    temperature: f64,
) -> Result<String, ChatError> {
    let prompt = template.render(&[("chat_history", chat_history), ("question", question)])?;
    let request =
        ChatRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(temperature);
    let rewritten = model.complete(request).await?;
    let rewritten = rewritten.trim();

    // A blank rewrite would wipe out the question; fall back to the original.
    if rewritten.is_empty() {
        Ok(question.to_string())
    } else {
        Ok(rewritten.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use crate::chat::prompts;

    #[test]
    fn sanitize_trims_and_flattens() {
        assert_eq!(
            sanitize_question("  what is\nthe capital\nof France?  "),
            "what is the capital of France?"
        );
    }

    #[test]
    fn sanitize_keeps_single_line_intact() {
        assert_eq!(sanitize_question("plain question"), "plain question");
    }

    struct RecordingModel {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl RecordingModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ChatRequest) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }

        async fn stream_complete(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<String, ChatError>>, ChatError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    fn condense_template() -> PromptTemplate {
        PromptTemplate::new(prompts::CONDENSE_EN, &["chat_history", "question"]).unwrap()
    }

    #[tokio::test]
    async fn sends_history_and_question_in_one_user_message() {
        let model = RecordingModel::new("What is the capital of France?");
        let model: Arc<dyn ChatModel> = Arc::new(model);

        let out = condense_question(
            &model,
            &condense_template(),
            "what about its capital?",
            "Human: tell me about France\nAssistant: France is a country in Europe.",
            0.4,
        )
        .await
        .unwrap();

        assert_eq!(out, "What is the capital of France?");
    }

    #[tokio::test]
    async fn blank_rewrite_falls_back_to_the_original_question() {
        let model: Arc<dyn ChatModel> = Arc::new(RecordingModel::new("   \n  "));

        let out = condense_question(
            &model,
            &condense_template(),
            "what about its capital?",
            "",
            0.4,
        )
        .await
        .unwrap();

        assert_eq!(out, "what about its capital?");
    }

    #[tokio::test]
    async fn request_carries_the_requested_temperature() {
        let recording = Arc::new(RecordingModel::new("ok"));
        let model: Arc<dyn ChatModel> = recording.clone();

        condense_question(&model, &condense_template(), "q", "", 0.1)
            .await
            .unwrap();

        let seen = recording.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, Some(0.1));
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[0].messages[0].role, "user");
        assert!(seen[0].messages[0].content.contains("Follow Up Input: q"));
        assert!(seen[0].messages[0].content.contains("Standalone question:"));
    }
}
