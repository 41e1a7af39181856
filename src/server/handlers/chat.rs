use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::sync::mpsc;

use crate::chat::{ChatEvent, ChatMode, Language};
use crate::core::errors::ChatError;
use crate::rag::Document;
use crate::server::handlers::{no_question, ChatParams};
use crate::state::AppState;

/// `POST /api/chatWithSearch` - runs the agent-search chain and answers once
/// the agent result and the captured documents have both settled.
pub async fn chat_with_search(
    State(state): State<Arc<AppState>>,
    method: Method,
    payload: Option<Json<ChatParams>>,
) -> Result<Response, ChatError> {
    if method != Method::POST {
        return Err(ChatError::MethodNotAllowed);
    }
    let Json(params) = payload.ok_or_else(no_question)?;
    let question = params.validated_question()?;
    let language = Language::from_flag(params.language);

    let events = state
        .pipeline
        .run(question, params.history, language, ChatMode::AgentSearch);

    let outcome = tokio::time::timeout(state.settings.chat.request_timeout(), drain(events))
        .await
        .map_err(|_| ChatError::DeadlineExceeded(state.settings.chat.request_timeout_secs))?;

    match outcome {
        Drained::Answer {
            text,
            source_documents,
        } => Ok(Json(json!({
            "text": text,
            "sourceDocuments": source_documents,
        }))
        .into_response()),
        // the failure message passes through verbatim
        Drained::Failed(message) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()),
    }
}

enum Drained {
    Answer {
        text: String,
        source_documents: Vec<Document>,
    },
    Failed(String),
}

async fn drain(mut events: mpsc::Receiver<ChatEvent>) -> Drained {
    let mut text = String::new();
    let mut source_documents = Vec::new();

    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::AnswerDelta(delta) => text.push_str(&delta),
            ChatEvent::SourceDocuments(documents) => source_documents = documents,
            ChatEvent::Error(message) => return Drained::Failed(message),
            ChatEvent::Done => break,
        }
    }

    Drained::Answer {
        text,
        source_documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::config::Settings;
    use crate::llm::{ChatModel, ChatRequest};
    use crate::rag::Retriever;
    use crate::server::router::router;
    use crate::tools::ToolRegistry;

    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: ChatRequest) -> Result<String, ChatError> {
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

    struct NeverModel;

    #[async_trait]
    impl ChatModel for NeverModel {
        fn name(&self) -> &str {
            "never"
        }

        async fn complete(&self, _request: ChatRequest) -> Result<String, ChatError> {
            std::future::pending().await
        }

        async fn stream_complete(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<String, ChatError>>, ChatError> {
            std::future::pending().await
        }
    }

    struct StubRetriever(Vec<Document>);

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn search(&self, _query: &str) -> Result<Vec<Document>, ChatError> {
            Ok(self.0.clone())
        }
    }

    fn app(model: Arc<dyn ChatModel>, timeout_secs: u64) -> axum::Router {
        let mut settings = Settings::default();
        settings.chat.request_timeout_secs = timeout_secs;

        let retriever: Arc<dyn Retriever> = Arc::new(StubRetriever(vec![Document::new(
            "Paris is the capital of France.",
            "paris.pdf",
        )]));
        let state = AppState::with_components(
            Arc::new(settings),
            model,
            retriever,
            ToolRegistry::new(),
        )
        .unwrap();
        router(state)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_question_gets_the_legacy_400_body() {
        let app = app(ScriptedModel::new(&[]), 300);
        let request = Request::builder()
            .uri("/api/chatWithSearch")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "No question in the request");
    }

    #[tokio::test]
    async fn wrong_method_is_rejected_with_405() {
        let app = app(ScriptedModel::new(&[]), 300);
        let request = Request::builder()
            .uri("/api/chatWithSearch")
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn agent_answer_and_documents_come_back_together() {
        // condense, then the materials search query, then the final decision
        let model = ScriptedModel::new(&[
            "What is the capital of France?",
            "capital of France",
            r#"{"type":"final","content":"Paris is the capital of France."}"#,
        ]);
        let app = app(model, 300);

        let request = Request::builder()
            .uri("/api/chatWithSearch")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"question":"what is the capital of France?","history":[],"language":0}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "Paris is the capital of France.");
        assert_eq!(
            body["sourceDocuments"][0]["pageContent"],
            "Paris is the capital of France."
        );
        assert_eq!(body["sourceDocuments"][0]["metadata"]["source"], "paris.pdf");
    }

    #[tokio::test]
    async fn deadline_expiry_maps_to_the_abort_error() {
        let app = app(Arc::new(NeverModel), 0);
        let request = Request::builder()
            .uri("/api/chatWithSearch")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"question":"slow?"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("AbortError: Time Limit"));
    }
}
