use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::ChatRequest;
use crate::core::errors::ChatError;

/// Text-completion oracle the pipeline talks to.
///
/// Implementations own their transport; callers only see completed text or a
/// channel of deltas. Dropping the streaming receiver cancels generation on
/// the producer side.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// provider name for logs (e.g. "openai")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn complete(&self, request: ChatRequest) -> Result<String, ChatError>;

    /// chat completion (streaming)
    async fn stream_complete(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<Result<String, ChatError>>, ChatError>;
}
