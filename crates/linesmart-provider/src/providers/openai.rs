//! OpenAI provider built on the OpenAI-compatible transport.
//!
//! Adds embeddings and a dedicated SOP generator on top of the common
//! capability operations.

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::metrics::MetricsCollector;
use crate::prompts;
use crate::providers::openai_compat::{OpenAiCompatClient, OpenAiCompatConfig};
use crate::traits::Provider;
use crate::types::{
    ChatRequest, EmbeddingItem, GenerationContext, GenerationOptions, HealthReport,
    NormalizedResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

const DEFAULT_TEMPERATURE: f32 = 0.3;
const SOP_TEMPERATURE: f32 = 0.2;
const SOP_TOP_P: f32 = 0.9;
const TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`OpenAiProvider`].
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub embedding_model: String,
    pub base_url: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }
}

/// OpenAI chat completions and embeddings.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: OpenAiCompatClient,
    embedding_model: String,
    metrics: Arc<MetricsCollector>,
}

impl OpenAiProvider {
    pub fn new(settings: OpenAiSettings, metrics: Arc<MetricsCollector>) -> Result<Self, ProviderError> {
        let client = OpenAiCompatClient::new(OpenAiCompatConfig {
            kind: ProviderKind::OpenAi,
            base_url: settings.base_url,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            timeout: TIMEOUT,
        })?;

        Ok(Self {
            client,
            embedding_model: settings.embedding_model,
            metrics,
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn sop_request(&self, prompt: &str, context: &GenerationContext, options: &GenerationOptions) -> ChatRequest {
        let mut request = ChatRequest::new(prompts::sop_prompt(prompt))
            .with_system(prompts::system_message(self.system_preamble(), context))
            .with_options(options);
        // Structured SOPs use fixed sampling regardless of the caller's temperature.
        request.temperature = Some(SOP_TEMPERATURE);
        request.top_p = Some(options.top_p.unwrap_or(SOP_TOP_P));
        request
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn current_model(&self) -> &str {
        self.client.model()
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    async fn complete(&self, request: ChatRequest) -> Result<NormalizedResult, ProviderError> {
        self.client.chat(&request).await
    }

    async fn probe(&self) -> Result<HealthReport, ProviderError> {
        let count = self.client.list_models(TIMEOUT).await?;
        Ok(HealthReport::healthy().with_models(count))
    }

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<EmbeddingItem>, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::not_configured(ProviderKind::OpenAi));
        }
        info!(model = %self.embedding_model, count = texts.len(), "Generating embeddings");

        let body = json!({
            "model": self.embedding_model,
            "input": texts,
        });

        let ctx = self.metrics.start_request(ProviderKind::OpenAi);
        match self.client.post::<EmbeddingResponse>("embeddings", &body).await {
            Ok(resp) => {
                self.metrics.record_success(ctx);
                Ok(resp.into_items())
            }
            Err(e) => {
                self.metrics.record_error(ctx, &e);
                Err(e)
            }
        }
    }

    async fn generate_sop(
        &self,
        prompt: &str,
        context: &GenerationContext,
        options: &GenerationOptions,
    ) -> Result<NormalizedResult, ProviderError> {
        let request = self.sop_request(prompt, context, options);
        info!(
            model = request.model.as_deref().unwrap_or(self.current_model()),
            prompt_len = request.user.len(),
            documents = context.documents.len(),
            "SOP request"
        );

        let result = self.metered(request).await?;
        info!(
            total_tokens = result.usage.total_tokens,
            finish_reason = ?result.finish_reason,
            "SOP received"
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    fn into_items(self) -> Vec<EmbeddingItem> {
        let mut items: Vec<EmbeddingItem> = self
            .data
            .into_iter()
            .map(|d| EmbeddingItem {
                embedding: d.embedding,
                index: d.index,
            })
            .collect();
        items.sort_by_key(|item| item.index);
        items
    }
}
