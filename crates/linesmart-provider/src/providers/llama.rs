//! Llama provider with two backends.
//!
//! A local Ollama server is used unless a Replicate API key is configured,
//! in which case predictions run on Replicate and are polled to completion.

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::metrics::MetricsCollector;
use crate::providers::{decode, http_client, trim_base_url};
use crate::traits::Provider;
use crate::types::{ChatRequest, FinishReason, HealthReport, NormalizedResult, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama2";
pub const REPLICATE_DEFAULT_MODEL: &str = "meta/llama-2-70b-chat";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const REPLICATE_PREDICTIONS_URL: &str = "https://api.replicate.com/v1/predictions";
const OLLAMA_TIMEOUT: Duration = Duration::from_secs(60);
const REPLICATE_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 60;
const REPETITION_PENALTY: f32 = 1.15;

/// Replicate model versions; unknown models use the 70b version.
static REPLICATE_VERSIONS: [(&str, &str); 3] = [
    (
        "meta/llama-2-70b-chat",
        "02e509c789964a7ea8736978a43525956ef40397be9033abf9fd2badfe68c9e3",
    ),
    (
        "meta/llama-2-13b-chat",
        "f4e2de70d66816a838a89eeeb621910adffb0dd0baba3976c96980970978018d",
    ),
    (
        "meta/llama-2-7b-chat",
        "13c3cdee13ee059ab779f0291d29054dab00a47dad8261375654de5540165fb0",
    ),
];

/// Settings for [`LlamaProvider`].
#[derive(Debug, Clone)]
pub struct LlamaSettings {
    /// Selects Replicate when present.
    pub replicate_api_key: Option<String>,
    /// Model override; otherwise the backend default.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub ollama_base_url: String,
}

impl Default for LlamaSettings {
    fn default() -> Self {
        Self {
            replicate_api_key: None,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            ollama_base_url: OLLAMA_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug)]
enum Backend {
    Ollama { base_url: String },
    Replicate { api_key: String },
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Ollama { .. } => "ollama",
            Backend::Replicate { .. } => "replicate",
        }
    }
}

#[derive(Debug)]
pub struct LlamaProvider {
    client: Client,
    backend: Backend,
    model: String,
    max_tokens: u32,
    metrics: Arc<MetricsCollector>,
}

impl LlamaProvider {
    pub fn new(settings: LlamaSettings, metrics: Arc<MetricsCollector>) -> Result<Self, ProviderError> {
        let (backend, default_model, timeout) = match settings
            .replicate_api_key
            .filter(|key| !key.trim().is_empty())
        {
            Some(api_key) => (
                Backend::Replicate { api_key },
                REPLICATE_DEFAULT_MODEL,
                REPLICATE_TIMEOUT,
            ),
            None => (
                Backend::Ollama {
                    base_url: trim_base_url(settings.ollama_base_url),
                },
                OLLAMA_DEFAULT_MODEL,
                OLLAMA_TIMEOUT,
            ),
        };

        Ok(Self {
            client: http_client(ProviderKind::Llama, timeout)?,
            backend,
            model: settings.model.unwrap_or_else(|| default_model.to_string()),
            max_tokens: settings.max_tokens,
            metrics,
        })
    }

    /// `ollama` or `replicate`.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn ollama_body(&self, request: &ChatRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user}));

        json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": request.temperature.unwrap_or(0.7),
                "top_p": request.top_p.unwrap_or(1.0),
                "num_predict": request.max_tokens.unwrap_or(self.max_tokens),
            },
        })
    }

    fn replicate_body(&self, request: &ChatRequest) -> Value {
        let model = request.model.as_deref().unwrap_or(&self.model);
        json!({
            "version": replicate_version(model),
            "input": {
                "prompt": llama2_prompt(request.system.as_deref(), &request.user),
                "max_new_tokens": request.max_tokens.unwrap_or(self.max_tokens),
                "temperature": request.temperature.unwrap_or(0.7),
                "top_p": request.top_p.unwrap_or(1.0),
                "repetition_penalty": REPETITION_PENALTY,
            },
        })
    }

    async fn chat_ollama(&self, base_url: &str, request: &ChatRequest) -> Result<NormalizedResult, ProviderError> {
        let body = self.ollama_body(request);
        debug!(model = %body["model"], "POST /api/chat");

        let response = self
            .client
            .post(format!("{base_url}/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(ollama_error)?;

        let resp: OllamaChatResponse = decode(ProviderKind::Llama, response).await?;
        let model = resp.model.unwrap_or_else(|| self.model.clone());
        Ok(NormalizedResult {
            content: resp.message.map(|m| m.content).unwrap_or_default(),
            model,
            usage: Usage::from_counts(resp.prompt_eval_count, resp.eval_count, None),
            finish_reason: FinishReason::from_upstream(resp.done_reason.as_deref()),
            provider: ProviderKind::Llama,
        })
    }

    async fn chat_replicate(&self, api_key: &str, request: &ChatRequest) -> Result<NormalizedResult, ProviderError> {
        let body = self.replicate_body(request);
        debug!(version = %body["version"], "POST predictions");

        let response = self
            .client
            .post(REPLICATE_PREDICTIONS_URL)
            .header("Authorization", format!("Token {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::http(ProviderKind::Llama, e))?;

        let created: Prediction = decode(ProviderKind::Llama, response).await?;
        let poll_url = created
            .urls
            .and_then(|urls| urls.get)
            .ok_or_else(|| ProviderError::upstream(ProviderKind::Llama, "prediction has no poll URL"))?;

        let prediction = self.poll_replicate(api_key, &poll_url).await?;
        Ok(NormalizedResult {
            content: prediction.output_text(),
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            usage: Usage::default(),
            finish_reason: FinishReason::from_upstream(prediction.status.as_deref()),
            provider: ProviderKind::Llama,
        })
    }

    async fn poll_replicate(&self, api_key: &str, url: &str) -> Result<Prediction, ProviderError> {
        for _ in 0..MAX_POLLS {
            tokio::time::sleep(POLL_INTERVAL).await;

            let response = self
                .client
                .get(url)
                .header("Authorization", format!("Token {api_key}"))
                .send()
                .await
                .map_err(|e| ProviderError::http(ProviderKind::Llama, e))?;
            let prediction: Prediction = decode(ProviderKind::Llama, response).await?;

            match prediction.status.as_deref() {
                Some("succeeded") => return Ok(prediction),
                Some("failed" | "canceled") => {
                    let message = prediction
                        .error
                        .as_ref()
                        .and_then(Value::as_str)
                        .unwrap_or("Prediction failed")
                        .to_string();
                    return Err(ProviderError::upstream(ProviderKind::Llama, message));
                }
                _ => {}
            }
        }
        Err(ProviderError::upstream(ProviderKind::Llama, "Prediction timeout"))
    }
}

#[async_trait]
impl Provider for LlamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Llama
    }

    fn current_model(&self) -> &str {
        &self.model
    }

    /// Ollama needs no credential.
    fn is_configured(&self) -> bool {
        true
    }

    fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    async fn complete(&self, request: ChatRequest) -> Result<NormalizedResult, ProviderError> {
        info!(backend = self.backend.name(), model = %self.model, "Llama request");
        let result = match &self.backend {
            Backend::Ollama { base_url } => self.chat_ollama(base_url, &request).await,
            Backend::Replicate { api_key } => self.chat_replicate(api_key, &request).await,
        }?;
        info!(backend = self.backend.name(), content_len = result.content.len(), "Llama response received");
        Ok(result)
    }

    async fn probe(&self) -> Result<HealthReport, ProviderError> {
        match &self.backend {
            Backend::Ollama { base_url } => {
                let response = self
                    .client
                    .get(format!("{base_url}/api/tags"))
                    .send()
                    .await
                    .map_err(ollama_error)?;
                let tags: OllamaTags = decode(ProviderKind::Llama, response).await?;
                Ok(HealthReport::healthy()
                    .with_backend("ollama")
                    .with_models(tags.models.len()))
            }
            Backend::Replicate { .. } => Ok(HealthReport::healthy()
                .with_backend("replicate")
                .with_model(self.model.clone())),
        }
    }
}

fn replicate_version(model: &str) -> &'static str {
    REPLICATE_VERSIONS
        .iter()
        .find(|(name, _)| *name == model)
        .unwrap_or(&REPLICATE_VERSIONS[0])
        .1
}

/// Llama 2 chat template.
fn llama2_prompt(system: Option<&str>, user: &str) -> String {
    match system {
        Some(system) => format!("<s>[INST] <<SYS>>\n{system}\n<</SYS>>\n\n{user} [/INST]"),
        None => format!("<s>[INST] {user} [/INST]"),
    }
}

fn ollama_error(err: reqwest::Error) -> ProviderError {
    if err.is_connect() {
        ProviderError::upstream(ProviderKind::Llama, "Ollama is not running. Start it with: ollama serve")
    } else {
        ProviderError::http(ProviderKind::Llama, err)
    }
}

// ──────────────────────────────────────────────────────────
// Ollama and Replicate response types
// ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

impl Prediction {
    /// Output arrives either as token chunks or as one string.
    fn output_text(&self) -> String {
        match &self.output {
            Some(Value::Array(chunks)) => chunks.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(text)) => text.clone(),
            _ => String::new(),
        }
    }
}
