use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::ChatModel;
use super::types::ChatRequest;
use crate::core::errors::ChatError;

/// OpenAI-compatible chat-completions client. Works against api.openai.com
/// and any server speaking the same protocol.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: Client::new(),
        }
    }

    fn request_body(&self, request: &ChatRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
            if let Some(s) = &request.stop {
                obj.insert("stop".to_string(), json!(s));
            }
        }

        body
    }

    async fn post_completions(&self, body: &Value) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let res = builder.send().await.map_err(ChatError::model_call)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ChatError::ModelCall(format!(
                "completion request failed ({}): {}",
                status, text
            )));
        }
        Ok(res)
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ChatError> {
        let body = self.request_body(&request, false);
        let res = self.post_completions(&body).await?;

        let payload: Value = res.json().await.map_err(ChatError::model_call)?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn stream_complete(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<Result<String, ChatError>>, ChatError> {
        let body = self.request_body(&request, true);
        let res = self.post_completions(&body).await?;

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        let chunk_str = String::from_utf8_lossy(&bytes);
                        for line in chunk_str.lines() {
                            match decode_stream_line(line) {
                                StreamLine::Delta(content) => {
                                    if tx.send(Ok(content)).await.is_err() {
                                        // receiver dropped: caller went away
                                        return;
                                    }
                                }
                                StreamLine::Done => return,
                                StreamLine::Skip => {}
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ChatError::model_call(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// One decoded line of the provider's SSE body.
#[derive(Debug, PartialEq)]
enum StreamLine {
    Delta(String),
    Done,
    Skip,
}

fn decode_stream_line(line: &str) -> StreamLine {
    let line = line.trim();
    if line == "data: [DONE]" {
        return StreamLine::Done;
    }
    let Some(data) = line.strip_prefix("data: ") else {
        return StreamLine::Skip;
    };
    let Ok(json) = serde_json::from_str::<Value>(data) else {
        return StreamLine::Skip;
    };
    match json["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => StreamLine::Delta(content.to_string()),
        _ => StreamLine::Skip,
    }
}
