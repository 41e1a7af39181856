//! Token streaming over server-sent events.
//!
//! The wire format is fixed by the existing UI: `generateAns` frames carry
//! one token each in `{"msg": …}`, a single `generateDocs` frame carries the
//! source documents, an `error` frame ends a failed stream. Frame ids count
//! up from 0 across all frame kinds.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use futures_util::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::chat::{ChatEvent, ChatMode, Language};
use crate::core::errors::ChatError;
use crate::server::handlers::{no_question, ChatParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// URL-encoded JSON `{ question, history, language }`.
    params: Option<String>,
}

/// `GET /api/chatStream?params=…` - runs the plain chain and streams the
/// answer token by token.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    method: Method,
    Query(query): Query<StreamQuery>,
) -> Result<Response, ChatError> {
    if method != Method::GET {
        return Err(ChatError::MethodNotAllowed);
    }

    let raw = query.params.ok_or_else(no_question)?;
    let params: ChatParams = serde_json::from_str(&raw).map_err(|_| no_question())?;
    let question = params.validated_question()?;
    let language = Language::from_flag(params.language);

    let events = state
        .pipeline
        .run(question, params.history, language, ChatMode::Plain);

    let (frames_tx, frames_rx) = mpsc::channel::<String>(32);
    tokio::spawn(forward_events(
        events,
        frames_tx,
        state.settings.chat.request_timeout(),
        state.settings.chat.request_timeout_secs,
    ));

    Ok(SseResponse::new(ReceiverStream::new(frames_rx)).into_response())
}

/// Bridges pipeline events onto SSE frames until the stream ends, the client
/// goes away, or the request deadline fires.
async fn forward_events(
    mut events: mpsc::Receiver<ChatEvent>,
    frames: mpsc::Sender<String>,
    deadline: Duration,
    budget_secs: u64,
) {
    let timeout = tokio::time::sleep(deadline);
    tokio::pin!(timeout);
    let mut id = 0u64;

    loop {
        tokio::select! {
            _ = &mut timeout => {
                let message = ChatError::DeadlineExceeded(budget_secs).to_string();
                let data = json!({ "error": message }).to_string();
                let _ = frames.send(format_event("error", id, &data)).await;
                return;
            }
            event = events.recv() => match event {
                Some(ChatEvent::AnswerDelta(token)) => {
                    let data = json!({ "msg": token }).to_string();
                    if frames.send(format_event("generateAns", id, &data)).await.is_err() {
                        // client disconnected; dropping `events` cancels the run
                        return;
                    }
                    id += 1;
                }
                Some(ChatEvent::SourceDocuments(documents)) => {
                    let data = json!({ "docs": documents }).to_string();
                    if frames.send(format_event("generateDocs", id, &data)).await.is_err() {
                        return;
                    }
                    id += 1;
                }
                Some(ChatEvent::Error(message)) => {
                    let data = json!({ "error": message }).to_string();
                    let _ = frames.send(format_event("error", id, &data)).await;
                    return;
                }
                Some(ChatEvent::Done) | None => return,
            }
        }
    }
}

fn format_event(event: &str, id: u64, data: &str) -> String {
    format!("event: {}\nid: {}\ndata: {}\n\n", event, id, data)
}

struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|frame| frame.map(|text| Ok(Bytes::from(text))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from_stream(self));
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream; charset=utf-8"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        response
    }
}
