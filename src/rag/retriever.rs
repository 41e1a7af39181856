//! Similarity search and the one-shot document capture.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use super::Document;
use crate::core::errors::ChatError;

/// Retrieval oracle: fetch passages relevant to a query, ranked by
/// similarity. One call per request.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Document>, ChatError>;
}

/// HTTP client for the external vector-index service.
#[derive(Clone)]
pub struct VectorIndexClient {
    base_url: String,
    namespace: String,
    top_k: usize,
    client: Client,
}

impl VectorIndexClient {
    pub fn new(base_url: String, namespace: String, top_k: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace,
            top_k,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Retriever for VectorIndexClient {
    async fn search(&self, query: &str) -> Result<Vec<Document>, ChatError> {
        let url = format!("{}/query", self.base_url);
        let body = json!({
            "query": query,
            "namespace": self.namespace,
            "top_k": self.top_k,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ChatError::retrieval)?;

        if !res.status().is_success() {
            return Err(ChatError::Retrieval(format!(
                "index query failed: {}",
                res.status()
            )));
        }

        let payload: Value = res.json().await.map_err(ChatError::retrieval)?;
        let documents = payload
            .get("documents")
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(documents).map_err(ChatError::retrieval)
    }
}

/// One-shot handoff of the documents a request retrieved.
///
/// The resolving side lives inside the pipeline (at the retrieval step and on
/// every failure path before it); the waiting side is consumed where the
/// terminal documents event is emitted. First resolution wins, later calls
/// are no-ops, and a handle dropped unresolved yields an empty list - the
/// waiter can never hang.
pub fn capture_channel() -> (DocumentCaptureHandle, DocumentCaptureFuture) {
    let (tx, rx) = oneshot::channel();
    (
        DocumentCaptureHandle {
            tx: Mutex::new(Some(tx)),
        },
        DocumentCaptureFuture { rx },
    )
}

pub struct DocumentCaptureHandle {
    tx: Mutex<Option<oneshot::Sender<Vec<Document>>>>,
}

impl DocumentCaptureHandle {
    pub fn resolve(&self, documents: Vec<Document>) {
        if let Ok(mut slot) = self.tx.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(documents);
            }
        }
    }
}

pub struct DocumentCaptureFuture {
    rx: oneshot::Receiver<Vec<Document>>,
}

impl DocumentCaptureFuture {
    pub async fn wait(self) -> Vec<Document> {
        self.rx.await.unwrap_or_default()
    }
}
