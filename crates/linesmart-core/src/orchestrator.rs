//! Provider selection, fallback, and the operations exposed to callers.

use crate::capabilities::{self, Capabilities};
use crate::config::Settings;
use crate::registry::ProviderRegistry;
use futures::future::join_all;
use linesmart_provider::prompts;
use linesmart_provider::recovery;
use linesmart_provider::{
    EmbeddingItem, GenerationContext, GenerationOptions, GenerationRequest, HealthReport,
    MetricsCollector, NormalizedResult, ProviderError, ProviderKind, QuizQuestion,
    TrainingContent, TrainingDocument, TrainingSection, Usage,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Token limit applied to structured training documents when the caller sets none.
pub const TRAINING_DOCUMENT_MAX_TOKENS: u32 = 4000;
/// Characters of raw output kept as the introduction of a degraded document.
const DEGRADED_INTRO_CHARS: usize = 500;

/// Operation families with their own default provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Training,
    Quiz,
    Translation,
    Sop,
    Embeddings,
    Analysis,
    Safety,
}

impl Task {
    fn default_provider(self) -> Option<ProviderKind> {
        match self {
            Task::Training | Task::Quiz | Task::Translation => None,
            Task::Sop | Task::Embeddings => Some(ProviderKind::OpenAi),
            Task::Analysis | Task::Safety => Some(ProviderKind::Claude),
        }
    }
}

/// Ordered providers to try: the primary, then at most one fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempts {
    pub primary: ProviderKind,
    pub fallback: Option<ProviderKind>,
}

impl Attempts {
    /// Fallback applies only when enabled, named, and different from the primary.
    pub fn plan(primary: ProviderKind, options: &GenerationOptions) -> Self {
        let fallback = options
            .fallback_provider
            .filter(|&fallback| options.enable_fallback && fallback != primary);
        Self { primary, fallback }
    }
}

/// A structured training document and where it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTraining {
    pub document: TrainingDocument,
    pub provider: ProviderKind,
    pub model: String,
    pub usage: Usage,
    /// Recovered by closing truncated JSON.
    pub partial: bool,
    /// Output was not recoverable; `document` wraps the raw text.
    pub degraded: bool,
}

/// Response of [`Orchestrator::list_providers`].
#[derive(Debug, Clone, Serialize)]
pub struct ProviderListing {
    pub providers: Vec<ProviderKind>,
    pub capabilities: BTreeMap<ProviderKind, Capabilities>,
    pub default: ProviderKind,
}

/// Single entry point over every registered provider.
pub struct Orchestrator {
    registry: ProviderRegistry,
    metrics: Arc<MetricsCollector>,
    default_provider: ProviderKind,
}

impl Orchestrator {
    pub fn new(
        registry: ProviderRegistry,
        metrics: Arc<MetricsCollector>,
        default_provider: ProviderKind,
    ) -> Self {
        Self {
            registry,
            metrics,
            default_provider,
        }
    }

    /// Build the production registry from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ProviderError> {
        let metrics = Arc::new(MetricsCollector::new());
        let registry = ProviderRegistry::from_settings(settings, Arc::clone(&metrics))?;
        Ok(Self::new(registry, metrics, settings.default_provider))
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Explicit choice, then the task default, then the global default.
    fn select(&self, explicit: Option<ProviderKind>, task: Task) -> ProviderKind {
        explicit
            .or_else(|| task.default_provider())
            .unwrap_or(self.default_provider)
    }

    /// Run `attempt` on the primary and, if it fails, once on the fallback.
    async fn with_fallback<T, F, Fut>(
        &self,
        operation: &'static str,
        attempts: Attempts,
        attempt: F,
    ) -> Result<T, ProviderError>
    where
        F: Fn(ProviderKind) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let primary_err = match attempt(attempts.primary).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        error!(provider = %attempts.primary, operation, error = %primary_err, "Generation failed");

        let Some(fallback) = attempts.fallback else {
            return Err(primary_err);
        };

        warn!(primary = %attempts.primary, fallback = %fallback, operation, "Attempting fallback provider");
        attempt(fallback).await.map_err(|fallback_err| {
            error!(provider = %fallback, operation, error = %fallback_err, "Fallback failed");
            ProviderError::FallbackExhausted {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            }
        })
    }

    /// Raw training content from the selected provider, with optional fallback.
    pub async fn generate_training_content(
        &self,
        request: &GenerationRequest,
    ) -> Result<NormalizedResult, ProviderError> {
        require("prompt", &request.prompt)?;
        let attempts = Attempts::plan(self.select(request.options.provider, Task::Training), &request.options);
        info!(
            provider = %attempts.primary,
            prompt_len = request.prompt.len(),
            documents = request.context.documents.len(),
            "Generating training content"
        );

        self.with_fallback("training content", attempts, |kind| async move {
            self.registry
                .get(kind)?
                .generate_training_content(&request.prompt, &request.context, &request.options)
                .await
        })
        .await
    }

    /// Training content recovered into a [`TrainingDocument`].
    ///
    /// Unrecoverable model output yields a degraded document wrapping the raw
    /// text rather than an error. Transport and configuration errors still
    /// propagate.
    pub async fn generate_training_document(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedTraining, ProviderError> {
        let mut request = request.clone();
        request.options.max_tokens = request
            .options
            .max_tokens
            .or(Some(TRAINING_DOCUMENT_MAX_TOKENS));

        let result = self.generate_training_content(&request).await?;
        let (document, partial, degraded) = match recovery::recover(&result.content) {
            Ok(recovered) => (recovered.document, recovered.partial, false),
            Err(ProviderError::ResponseFormat(message)) => {
                error!(provider = %result.provider, error = %message, "Failed to parse training response");
                (degraded_document(&result.content), false, true)
            }
            Err(e) => return Err(e),
        };

        Ok(GeneratedTraining {
            document,
            provider: result.provider,
            model: result.model,
            usage: result.usage,
            partial,
            degraded,
        })
    }

    /// Standard operating procedure. Adapters without a native SOP generator
    /// get an SOP-shaped training request instead.
    pub async fn generate_sop(
        &self,
        request: &GenerationRequest,
    ) -> Result<NormalizedResult, ProviderError> {
        require("SOP prompt", &request.prompt)?;
        let attempts = Attempts::plan(self.select(request.options.provider, Task::Sop), &request.options);
        info!(provider = %attempts.primary, prompt_len = request.prompt.len(), "Generating SOP");

        self.with_fallback("SOP", attempts, |kind| async move {
            let provider = self.registry.get(kind)?;
            match provider
                .generate_sop(&request.prompt, &request.context, &request.options)
                .await
            {
                Err(ProviderError::Unsupported { .. }) => {
                    provider
                        .generate_training_content(
                            &prompts::sop_fallback_prompt(&request.prompt),
                            &request.context,
                            &request.options,
                        )
                        .await
                }
                other => other,
            }
        })
        .await
    }

    pub async fn generate_quiz(
        &self,
        content: &str,
        question_count: usize,
        provider: Option<ProviderKind>,
    ) -> Result<Vec<QuizQuestion>, ProviderError> {
        require("content", content)?;
        if question_count == 0 {
            return Err(ProviderError::InvalidRequest(
                "question count must be at least 1".to_string(),
            ));
        }
        let kind = self.select(provider, Task::Quiz);
        info!(provider = %kind, question_count, "Generating quiz");

        self.registry
            .get(kind)?
            .generate_quiz(content, question_count)
            .await
            .map_err(|e| {
                error!(provider = %kind, error = %e, "Quiz generation failed");
                e
            })
    }

    pub async fn translate_content(
        &self,
        content: &str,
        target_language: &str,
        provider: Option<ProviderKind>,
    ) -> Result<String, ProviderError> {
        require("content", content)?;
        require("target language", target_language)?;
        let kind = self.select(provider, Task::Translation);
        info!(provider = %kind, target_language, content_len = content.len(), "Translating content");

        self.registry
            .get(kind)?
            .translate_content(content, target_language)
            .await
            .map_err(|e| {
                error!(provider = %kind, error = %e, "Translation failed");
                e
            })
    }

    pub async fn analyze_employee_performance(
        &self,
        employee_data: &Value,
        provider: Option<ProviderKind>,
    ) -> Result<String, ProviderError> {
        if employee_data.is_null() {
            return Err(ProviderError::InvalidRequest("employee data is required".to_string()));
        }
        let kind = self.select(provider, Task::Analysis);
        info!(provider = %kind, "Analyzing employee performance");

        self.registry
            .get(kind)?
            .analyze_employee_performance(employee_data)
            .await
    }

    /// Safety training text. Adapters without a native safety generator get a
    /// safety-emphasis training request and only its text is returned.
    pub async fn generate_safety_content(
        &self,
        scenario: &str,
        context: &GenerationContext,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        require("safety scenario", scenario)?;
        let kind = self.select(options.provider, Task::Safety);
        info!(provider = %kind, "Generating safety content");

        let provider = self.registry.get(kind)?;
        match provider.generate_safety_content(scenario, context).await {
            Err(ProviderError::Unsupported { .. }) => provider
                .generate_training_content(&prompts::safety_fallback_prompt(scenario), context, options)
                .await
                .map(|result| result.content),
            other => other,
        }
    }

    /// Embeddings always come from OpenAI.
    pub async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<EmbeddingItem>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let kind = self.select(None, Task::Embeddings);
        info!(count = texts.len(), "Generating embeddings");
        self.registry.get(kind)?.generate_embeddings(texts).await
    }

    /// Probe every registered provider concurrently.
    pub async fn health_check_all(&self) -> BTreeMap<ProviderKind, HealthReport> {
        let checks = self.registry.iter().map(|(&kind, provider)| {
            let provider = Arc::clone(provider);
            async move { (kind, provider.health_check().await) }
        });
        join_all(checks).await.into_iter().collect()
    }

    pub async fn health_check(&self, provider: ProviderKind) -> Result<HealthReport, ProviderError> {
        Ok(self.registry.get(provider)?.health_check().await)
    }

    pub fn list_providers(&self) -> ProviderListing {
        let providers = self.registry.kinds();
        let capabilities = providers
            .iter()
            .map(|&kind| (kind, capabilities::capabilities(kind)))
            .collect();
        ProviderListing {
            providers,
            capabilities,
            default: self.default_provider,
        }
    }

    /// Recommended provider for `task_type`; unrecognized tasks get the default.
    pub fn recommend_provider(&self, task_type: &str) -> ProviderKind {
        capabilities::recommend(task_type).unwrap_or(self.default_provider)
    }
}

fn require(field: &str, value: &str) -> Result<(), ProviderError> {
    if value.trim().is_empty() {
        Err(ProviderError::InvalidRequest(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Wrap unparseable model output so callers still get a usable document.
pub fn degraded_document(raw: &str) -> TrainingDocument {
    let section = TrainingSection::new("Generated Content", raw)
        .with_key_points(vec!["Review the full content for detailed information".to_string()]);
    TrainingDocument {
        training: TrainingContent::default()
            .with_introduction(raw.chars().take(DEGRADED_INTRO_CHARS).collect::<String>())
            .with_sections(vec![section])
            .with_safety_notes(vec!["Follow all safety procedures".to_string()])
            .with_best_practices(vec!["Review documentation before starting".to_string()])
            .with_common_mistakes(vec!["Not following documented procedures".to_string()]),
        ..Default::default()
    }
}
