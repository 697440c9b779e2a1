//! xAI Grok provider.
//!
//! Uses the OpenAI-compatible chat completions API at `https://api.x.ai/v1`
//! unless a different base URL is configured.

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::metrics::MetricsCollector;
use crate::prompts;
use crate::providers::openai_compat::{OpenAiCompatClient, OpenAiCompatConfig};
use crate::traits::Provider;
use crate::types::{ChatRequest, HealthReport, NormalizedResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-3";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for [`GrokProvider`].
#[derive(Debug, Clone)]
pub struct GrokSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for GrokSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: XAI_BASE_URL.to_string(),
        }
    }
}

/// Grok over the xAI API.
#[derive(Debug)]
pub struct GrokProvider {
    client: OpenAiCompatClient,
    metrics: Arc<MetricsCollector>,
}

impl GrokProvider {
    pub fn new(settings: GrokSettings, metrics: Arc<MetricsCollector>) -> Result<Self, ProviderError> {
        let client = OpenAiCompatClient::new(OpenAiCompatConfig {
            kind: ProviderKind::Grok,
            base_url: settings.base_url,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
            temperature: 0.7,
            timeout: TIMEOUT,
        })?;
        Ok(Self { client, metrics })
    }
}

#[async_trait]
impl Provider for GrokProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Grok
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
        let count = self.client.list_models(PROBE_TIMEOUT).await?;
        Ok(HealthReport::healthy().with_models(count))
    }

    async fn analyze_employee_performance(&self, employee_data: &Value) -> Result<String, ProviderError> {
        let request = ChatRequest::new(prompts::analysis_prompt(employee_data))
            .with_system(prompts::ANALYSIS_SYSTEM_PROMPT)
            .with_temperature(0.7)
            .with_max_tokens(2000);
        Ok(self.metered(request).await?.content)
    }
}
