use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chat::{ChatPipeline, PromptLibrary};
use crate::config::Settings;
use crate::core::errors::ChatError;
use crate::llm::{ChatModel, OpenAiProvider};
use crate::rag::{Retriever, VectorIndexClient};
use crate::tools::{CalculatorTool, EncyclopediaTool, SearchTool, Tool, ToolRegistry};

/// Shared application state: read-only `Arc`s handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: ChatPipeline,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wires the production oracles: OpenAI-compatible model provider,
    /// vector-index retriever, and the built-in tool set.
    pub fn initialize(settings: Settings) -> Result<Arc<Self>, ChatError> {
        let settings = Arc::new(settings);

        let model: Arc<dyn ChatModel> = Arc::new(OpenAiProvider::new(
            settings.model.base_url.clone(),
            settings.model.api_key.clone(),
            settings.model.model.clone(),
        ));

        let retriever: Arc<dyn Retriever> = Arc::new(VectorIndexClient::new(
            settings.retriever.index_url.clone(),
            settings.retriever.namespace.clone(),
            settings.retriever.top_k,
        ));

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SearchTool::new(&settings.tools)) as Arc<dyn Tool>);
        tools.register(Arc::new(CalculatorTool) as Arc<dyn Tool>);
        tools.register(Arc::new(EncyclopediaTool::new()) as Arc<dyn Tool>);
        tracing::info!("Registered tools: {:?}", tools.names());

        Self::with_components(settings, model, retriever, tools)
    }

    /// Assembles state from explicit components. Also the seam tests use to
    /// substitute scripted oracles.
    pub fn with_components(
        settings: Arc<Settings>,
        model: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
        tools: ToolRegistry,
    ) -> Result<Arc<Self>, ChatError> {
        // template validation happens here, before the server accepts traffic
        let prompts = Arc::new(PromptLibrary::new()?);
        let pipeline = ChatPipeline::new(
            settings.clone(),
            model,
            retriever,
            tools,
            prompts,
        );

        Ok(Arc::new(Self {
            settings,
            pipeline,
            started_at: Utc::now(),
        }))
    }
}
