pub mod chat;
pub mod health;
pub mod stream;

use serde::Deserialize;

use crate::core::errors::ChatError;

/// Chat request payload. Arrives as the POST body on the synchronous route
/// and as the `params` query parameter (URL-encoded JSON) on the streaming
/// route.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatParams {
    #[serde(default)]
    pub question: Option<String>,
    /// Past exchanges as `[question, answer]` pairs, oldest first.
    #[serde(default)]
    pub history: Vec<(String, String)>,
    /// `0` = English, anything else = Chinese.
    #[serde(default)]
    pub language: i64,
}

impl ChatParams {
    /// The question, or the validation failure both endpoints answer with.
    pub fn validated_question(&self) -> Result<String, ChatError> {
        match self.question.as_deref().map(str::trim) {
            Some(question) if !question.is_empty() => Ok(question.to_string()),
            _ => Err(no_question()),
        }
    }
}

pub(crate) fn no_question() -> ChatError {
    ChatError::Validation("No question in the request".to_string())
}
