use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Request-level failures for the chat endpoints.
///
/// `UnknownTool` and `ToolFailed` never reach the HTTP layer directly: the
/// agent loop absorbs them as observations and keeps reasoning. Everything
/// else maps onto a terminal JSON response.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("model call failed: {0}")]
    ModelCall(String),
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool '{name}' failed: {message}")]
    ToolFailed { name: String, message: String },
    #[error("agent exceeded the maximum of {0} steps without a final answer")]
    MaxStepsExceeded(usize),
    #[error("AbortError: Time Limit {0}s")]
    DeadlineExceeded(u64),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ChatError::Internal(err.to_string())
    }

    pub fn model_call<E: std::fmt::Display>(err: E) -> Self {
        ChatError::ModelCall(err.to_string())
    }

    pub fn retrieval<E: std::fmt::Display>(err: E) -> Self {
        ChatError::Retrieval(err.to_string())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // The legacy clients key off "message" for validation failures and
        // "error" for everything else.
        let body = match &self {
            ChatError::Validation(msg) => Json(json!({ "message": msg })),
            other => Json(json!({ "error": other.to_string() })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_message_carries_the_budget() {
        let err = ChatError::DeadlineExceeded(300);
        assert_eq!(err.to_string(), "AbortError: Time Limit 300s");
    }

    #[test]
    fn validation_renders_the_raw_message() {
        let err = ChatError::Validation("No question in the request".to_string());
        assert_eq!(err.to_string(), "No question in the request");
    }
}
