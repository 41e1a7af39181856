//! The shared question-answering pipeline.
//!
//! Both endpoints run the same stages - prepare history, condense, retrieve,
//! prompt, answer - and differ only in the answering step: the plain chain
//! streams tokens straight from the model, the agent chain runs the bounded
//! tool loop and emits one consolidated answer. Events flow to the transport
//! over a bounded channel; a dropped receiver makes the next send fail, which
//! unwinds the whole request.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::AgentExecutor;
use crate::chat::condense::{condense_question, sanitize_question};
use crate::chat::events::ChatEvent;
use crate::chat::history::HistoryManager;
use crate::chat::prompt::{cite_messages, plain_messages, PromptLibrary};
use crate::chat::Language;
use crate::config::Settings;
use crate::core::errors::ChatError;
use crate::llm::{ChatModel, ChatRequest};
use crate::rag::{capture_channel, combine_documents, Document, DocumentCaptureHandle, Retriever};
use crate::tools::ToolRegistry;

const PLAIN_TEMPERATURE: f64 = 0.4;
const AGENT_CONDENSE_TEMPERATURE: f64 = 0.1;
const MATERIALS_TEMPERATURE: f64 = 0.1;
const AGENT_TEMPERATURE: f64 = 0.3;

/// Which answering chain a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Token-streamed QA over retrieved context only.
    Plain,
    /// Tool-using agent that also gathers web materials for citations.
    AgentSearch,
}

#[derive(Clone)]
pub struct ChatPipeline {
    settings: Arc<Settings>,
    model: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    tools: ToolRegistry,
    prompts: Arc<PromptLibrary>,
}

impl ChatPipeline {
    pub fn new(
        settings: Arc<Settings>,
        model: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
        tools: ToolRegistry,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            settings,
            model,
            retriever,
            tools,
            prompts,
        }
    }

    /// Spawns the request task and hands back its event stream. The stream
    /// always terminates: `...deltas, SourceDocuments, Done` on success, or
    /// `Error` as the final event on failure.
    pub fn run(
        &self,
        question: String,
        history: Vec<(String, String)>,
        language: Language,
        mode: ChatMode,
    ) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(32);
        let pipeline = self.clone();

        tokio::spawn(async move {
            let request_id = Uuid::new_v4();
            tracing::info!(%request_id, ?mode, ?language, "chat request started");

            let (capture, capture_future) = capture_channel();
            let result = pipeline
                .run_inner(&question, &history, language, mode, &capture, &tx)
                .await;

            match result {
                Ok(()) => {
                    let documents = capture_future.wait().await;
                    tracing::info!(%request_id, documents = documents.len(), "chat request finished");
                    if tx.send(ChatEvent::SourceDocuments(documents)).await.is_err() {
                        return;
                    }
                    let _ = tx.send(ChatEvent::Done).await;
                }
                Err(err) => {
                    // the capture side must settle before the terminal event
                    capture.resolve(Vec::new());
                    tracing::error!(%request_id, "chat request failed: {}", err);
                    let _ = tx.send(ChatEvent::Error(err.to_string())).await;
                }
            }
        });

        rx
    }

    async fn run_inner(
        &self,
        question: &str,
        history: &[(String, String)],
        language: Language,
        mode: ChatMode,
        capture: &DocumentCaptureHandle,
        tx: &mpsc::Sender<ChatEvent>,
    ) -> Result<(), ChatError> {
        let question = sanitize_question(question);
        let manager = HistoryManager::new(
            self.settings.chat.history_window,
            self.settings.chat.summarize_trimmed,
        );
        let history_block = manager.prepare(&self.model, history).await;

        match mode {
            ChatMode::Plain => {
                self.run_plain(&question, &history_block, language, capture, tx)
                    .await
            }
            ChatMode::AgentSearch => {
                self.run_agent(&question, &history_block, language, capture, tx)
                    .await
            }
        }
    }

    async fn run_plain(
        &self,
        question: &str,
        history_block: &str,
        language: Language,
        capture: &DocumentCaptureHandle,
        tx: &mpsc::Sender<ChatEvent>,
    ) -> Result<(), ChatError> {
        let set = self.prompts.plain(language);
        let standalone = condense_question(
            &self.model,
            &set.condense,
            question,
            history_block,
            PLAIN_TEMPERATURE,
        )
        .await?;

        let documents = self.retriever.search(&standalone).await?;
        log_retrieved(&documents);
        capture.resolve(documents.clone());
        let context = combine_documents(&documents);

        let messages = plain_messages(set, &context, history_block, &standalone)?;
        let request = ChatRequest::new(messages).with_temperature(PLAIN_TEMPERATURE);
        let mut deltas = self.model.stream_complete(request).await?;

        while let Some(delta) = deltas.recv().await {
            let token = delta?;
            if tx.send(ChatEvent::AnswerDelta(token)).await.is_err() {
                // client went away; dropping the receiver stops the provider
                return Ok(());
            }
        }
        Ok(())
    }

    async fn run_agent(
        &self,
        question: &str,
        history_block: &str,
        language: Language,
        capture: &DocumentCaptureHandle,
        tx: &mpsc::Sender<ChatEvent>,
    ) -> Result<(), ChatError> {
        let set = self.prompts.cite(language);
        let standalone = condense_question(
            &self.model,
            &set.condense,
            question,
            history_block,
            AGENT_CONDENSE_TEMPERATURE,
        )
        .await?;

        // grounding retrieval and web materials are independent
        let (documents, materials) = tokio::join!(
            self.retriever.search(&standalone),
            self.gather_materials(&standalone, language),
        );
        let documents = documents?;
        log_retrieved(&documents);
        capture.resolve(documents.clone());
        let context = combine_documents(&documents);

        let messages = cite_messages(
            set,
            &context,
            &materials,
            history_block,
            &standalone,
            &self.tools.render_descriptions(),
        )?;

        let executor = AgentExecutor::new(self.model.clone(), self.tools.clone())
            .with_max_steps(self.settings.chat.max_steps)
            .with_tool_timeout(self.settings.tools.tool_timeout());
        let outcome = executor.run(messages, AGENT_TEMPERATURE).await?;

        for step in &outcome.steps {
            tracing::debug!(tool = %step.tool_name, input = %step.tool_input, "agent step");
        }

        let _ = tx.send(ChatEvent::AnswerDelta(outcome.answer)).await;
        Ok(())
    }

    /// Search-engine materials for the citation prompt. Best-effort: any
    /// failure degrades to a line the model can read, never a request error.
    async fn gather_materials(&self, question: &str, language: Language) -> String {
        let result = async {
            let prompt = self
                .prompts
                .search_query(language)
                .render(&[("question", question)])?;
            let request = ChatRequest::new(vec![crate::llm::ChatMessage::user(prompt)])
                .with_temperature(MATERIALS_TEMPERATURE);
            let query = self.model.complete(request).await?;
            let query = query.trim();

            self.tools
                .invoke("web-search", query, self.settings.tools.tool_timeout())
                .await
        }
        .await;

        match result {
            Ok(materials) => materials,
            Err(err) => {
                tracing::warn!("materials gathering failed: {}", err);
                format!("Web search is unavailable for this question ({}).", err)
            }
        }
    }
}

fn log_retrieved(documents: &[Document]) {
    let sources: Vec<&str> = documents.iter().filter_map(Document::source).collect();
    tracing::debug!(count = documents.len(), ?sources, "retrieval finished");
}
