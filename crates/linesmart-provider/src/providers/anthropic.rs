//! Anthropic Claude provider implementation.
//!
//! Implements the Provider trait for Anthropic's Messages API, non-streaming.
//! Claude also carries the performance-analysis and safety extensions.

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::metrics::MetricsCollector;
use crate::prompts;
use crate::providers::{decode, http_client, trim_base_url};
use crate::traits::Provider;
use crate::types::{
    ChatRequest, FinishReason, GenerationContext, HealthReport, NormalizedResult, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const TIMEOUT: Duration = Duration::from_secs(30);
/// Keys this short are treated as placeholders.
const MIN_KEY_LEN: usize = 11;

/// Settings for [`AnthropicProvider`].
#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: API_BASE.to_string(),
        }
    }
}

/// Anthropic Claude provider.
#[derive(Debug)]
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    base_url: String,
    metrics: Arc<MetricsCollector>,
}

impl AnthropicProvider {
    pub fn new(settings: AnthropicSettings, metrics: Arc<MetricsCollector>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(ProviderKind::Claude, TIMEOUT)?,
            api_key: settings
                .api_key
                .filter(|key| key.trim().chars().count() >= MIN_KEY_LEN),
            model: settings.model,
            max_tokens: settings.max_tokens,
            base_url: trim_base_url(settings.base_url),
            metrics,
        })
    }

    /// Convert a chat request into the Messages API request body.
    fn build_request_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens),
            "messages": [{"role": "user", "content": request.user}],
            "temperature": request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        });

        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = json!(top_p);
        }

        body
    }

    fn normalize(&self, message: MessageResponse) -> NormalizedResult {
        let content = message
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        let usage = message
            .usage
            .map(|u| Usage::from_counts(u.input_tokens, u.output_tokens, None))
            .unwrap_or_default();

        NormalizedResult {
            content,
            model: message.model.unwrap_or_else(|| self.model.clone()),
            usage,
            finish_reason: FinishReason::from_upstream(message.stop_reason.as_deref()),
            provider: ProviderKind::Claude,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn current_model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    async fn complete(&self, request: ChatRequest) -> Result<NormalizedResult, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(ProviderKind::Claude))?;

        let body = self.build_request_body(&request);
        debug!(model = %body["model"], "POST /v1/messages");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::http(ProviderKind::Claude, e))?;

        let message: MessageResponse = decode(ProviderKind::Claude, response).await?;
        Ok(self.normalize(message))
    }

    /// No model-list endpoint; a 10-token completion stands in.
    async fn probe(&self) -> Result<HealthReport, ProviderError> {
        let result = self
            .complete(ChatRequest::new("Hi").with_max_tokens(10))
            .await?;
        Ok(HealthReport::healthy().with_model(result.model))
    }

    async fn analyze_employee_performance(&self, employee_data: &Value) -> Result<String, ProviderError> {
        let request = ChatRequest::new(prompts::analysis_prompt(employee_data))
            .with_system(prompts::ANALYSIS_SYSTEM_PROMPT)
            .with_temperature(0.7)
            .with_max_tokens(2000);
        Ok(self.metered(request).await?.content)
    }

    async fn generate_safety_content(
        &self,
        scenario: &str,
        context: &GenerationContext,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest::new(prompts::safety_prompt(scenario))
            .with_system(prompts::safety_system_prompt(context))
            .with_temperature(0.5);
        Ok(self.metered(request).await?.content)
    }
}

// ──────────────────────────────────────────────────────────
// Messages API response types
// ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
}
