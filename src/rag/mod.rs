//! Retrieval against the external vector index.
//!
//! This module provides:
//! - `Document`: a retrieved passage plus its citation metadata
//! - `Retriever`: the similarity-search interface the pipeline consumes
//! - `VectorIndexClient`: HTTP implementation against the index service
//! - `DocumentCapture`: one-shot handoff of the documents a request used

mod context;
mod retriever;

pub use context::combine_documents;
pub use retriever::{
    capture_channel, DocumentCaptureFuture, DocumentCaptureHandle, Retriever, VectorIndexClient,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved passage. Field names match the wire format the UI already
/// consumes (`pageContent`, open-ended `metadata` with a `source` key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("source".to_string(), Value::String(source.into()));
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}
