//! Google Gemini provider over the `generateContent` REST API.
//!
//! Gemini takes a single user turn, so the system message is prepended to
//! the user text.

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::metrics::MetricsCollector;
use crate::prompts;
use crate::providers::{decode, http_client, trim_base_url};
use crate::traits::Provider;
use crate::types::{ChatRequest, FinishReason, HealthReport, NormalizedResult, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const TIMEOUT: Duration = Duration::from_secs(30);
const TOP_K: u32 = 40;

/// Settings for [`GeminiProvider`].
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: API_BASE.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    base_url: String,
    metrics: Arc<MetricsCollector>,
}

impl GeminiProvider {
    pub fn new(settings: GeminiSettings, metrics: Arc<MetricsCollector>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(ProviderKind::Gemini, TIMEOUT)?,
            api_key: settings.api_key.filter(|key| !key.trim().is_empty()),
            model: settings.model,
            max_tokens: settings.max_tokens,
            base_url: trim_base_url(settings.base_url),
            metrics,
        })
    }

    fn build_request_body(&self, request: &ChatRequest) -> Value {
        let text = match &request.system {
            Some(system) => format!("{system}\n\n{}", request.user),
            None => request.user.clone(),
        };

        json!({
            "contents": [{"role": "user", "parts": [{"text": text}]}],
            "generationConfig": {
                "temperature": request.temperature.unwrap_or(0.7),
                "topP": request.top_p.unwrap_or(1.0),
                "topK": TOP_K,
                "maxOutputTokens": request.max_tokens.unwrap_or(self.max_tokens),
            },
        })
    }

    fn normalize(&self, resp: GenerateResponse, model: String) -> Result<NormalizedResult, ProviderError> {
        if let Some(feedback) = resp.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            return Err(ProviderError::upstream(
                ProviderKind::Gemini,
                format!("prompt blocked: {feedback}"),
            ));
        }

        let candidate = resp.candidates.into_iter().next();
        let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
        let content = candidate
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = resp
            .usage_metadata
            .map(|u| {
                Usage::from_counts(u.prompt_token_count, u.candidates_token_count, u.total_token_count)
            })
            .unwrap_or_default();

        Ok(NormalizedResult {
            content,
            model,
            usage,
            finish_reason: FinishReason::from_upstream(finish_reason.as_deref()),
            provider: ProviderKind::Gemini,
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
            .ok_or_else(|| ProviderError::not_configured(ProviderKind::Gemini))?;

        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let body = self.build_request_body(&request);
        debug!(model = %model, "POST generateContent");

        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::http(ProviderKind::Gemini, e))?;

        let resp: GenerateResponse = decode(ProviderKind::Gemini, response).await?;
        self.normalize(resp, model)
    }

    async fn probe(&self) -> Result<HealthReport, ProviderError> {
        let result = self
            .complete(ChatRequest::new("Health check").with_max_tokens(10))
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
}

// ──────────────────────────────────────────────────────────
// generateContent response types
// ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
    #[serde(default)]
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
