use async_trait::async_trait;
use linesmart_core::{Orchestrator, ProviderRegistry};
use linesmart_provider::{
    ChatRequest, EmbeddingItem, FinishReason, GenerationContext, GenerationOptions,
    GenerationRequest, HealthReport, HealthStatus, MetricsCollector, NormalizedResult, Provider,
    ProviderError, ProviderKind, Usage,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const DOCUMENT: &str = r#"{"training":{"introduction":"Lockout basics","sections":[{"title":"Isolate","content":"Shut off power","keyPoints":["Verify zero energy"]}],"safetyNotes":[],"bestPractices":[],"commonMistakes":[]},"quiz":[]}"#;

/// Canned backend. Native extensions mirror the real adapters: OpenAI writes
/// SOPs and embeddings, Claude does analysis and safety.
struct Mock {
    kind: ProviderKind,
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
    metrics: Arc<MetricsCollector>,
}

impl Mock {
    fn ok(kind: ProviderKind, metrics: &Arc<MetricsCollector>, content: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply: Ok(content.to_string()),
            prompts: Mutex::new(Vec::new()),
            metrics: Arc::clone(metrics),
        })
    }

    fn failing(kind: ProviderKind, metrics: &Arc<MetricsCollector>, message: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
            metrics: Arc::clone(metrics),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Provider for Mock {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn current_model(&self) -> &str {
        "mock-1"
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    async fn complete(&self, request: ChatRequest) -> Result<NormalizedResult, ProviderError> {
        self.prompts.lock().unwrap().push(request.user);
        match &self.reply {
            Ok(content) => Ok(NormalizedResult {
                content: content.clone(),
                model: "mock-1".to_string(),
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                },
                finish_reason: FinishReason::Stop,
                provider: self.kind,
            }),
            Err(message) => Err(ProviderError::upstream(self.kind, message.clone())),
        }
    }

    async fn probe(&self) -> Result<HealthReport, ProviderError> {
        match &self.reply {
            Ok(_) => Ok(HealthReport::healthy().with_model("mock-1")),
            Err(message) => Err(ProviderError::upstream(self.kind, message.clone())),
        }
    }

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<EmbeddingItem>, ProviderError> {
        if self.kind != ProviderKind::OpenAi {
            return Err(self.unsupported("embeddings"));
        }
        Ok(texts
            .iter()
            .enumerate()
            .map(|(index, text)| EmbeddingItem {
                embedding: vec![text.len() as f32],
                index,
            })
            .collect())
    }

    async fn analyze_employee_performance(&self, employee_data: &Value) -> Result<String, ProviderError> {
        if self.kind != ProviderKind::Claude {
            return Err(self.unsupported("performance analysis"));
        }
        Ok(format!("analysis of {}", employee_data["name"].as_str().unwrap_or("?")))
    }

    async fn generate_safety_content(
        &self,
        scenario: &str,
        _context: &GenerationContext,
    ) -> Result<String, ProviderError> {
        if self.kind != ProviderKind::Claude {
            return Err(self.unsupported("safety content"));
        }
        Ok(format!("native safety: {scenario}"))
    }

    async fn generate_sop(
        &self,
        prompt: &str,
        context: &GenerationContext,
        options: &GenerationOptions,
    ) -> Result<NormalizedResult, ProviderError> {
        if self.kind != ProviderKind::OpenAi {
            return Err(self.unsupported("SOP generation"));
        }
        self.generate_training_content(&format!("native sop: {prompt}"), context, options)
            .await
    }
}

fn orchestrator(providers: &[Arc<Mock>], default: ProviderKind, metrics: &Arc<MetricsCollector>) -> Orchestrator {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Arc::clone(provider) as Arc<dyn Provider>);
    }
    Orchestrator::new(registry, Arc::clone(metrics), default)
}

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        ..Default::default()
    }
}

fn with_fallback(prompt: &str, primary: ProviderKind, fallback: ProviderKind) -> GenerationRequest {
    let mut req = request(prompt);
    req.options.provider = Some(primary);
    req.options.enable_fallback = true;
    req.options.fallback_provider = Some(fallback);
    req
}

#[tokio::test]
async fn test_fallback_rescues_failed_primary() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::failing(ProviderKind::OpenAi, &metrics, "HTTP 500: boom");
    let claude = Mock::ok(ProviderKind::Claude, &metrics, "rescued");
    let orch = orchestrator(&[openai.clone(), claude.clone()], ProviderKind::OpenAi, &metrics);

    let result = orch
        .generate_training_content(&with_fallback("Forklift safety", ProviderKind::OpenAi, ProviderKind::Claude))
        .await
        .unwrap();

    assert_eq!(result.provider, ProviderKind::Claude);
    assert_eq!(result.content, "rescued");
    assert_eq!(openai.calls(), 1);
    assert_eq!(claude.calls(), 1);

    let report = metrics.all_metrics();
    assert_eq!(report.total_requests, 2);
    assert_eq!(report.total_errors, 1);
}

#[tokio::test]
async fn test_both_failures_are_reported() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::failing(ProviderKind::OpenAi, &metrics, "primary down");
    let claude = Mock::failing(ProviderKind::Claude, &metrics, "fallback down");
    let orch = orchestrator(&[openai.clone(), claude.clone()], ProviderKind::OpenAi, &metrics);

    let err = orch
        .generate_training_content(&with_fallback("Forklift safety", ProviderKind::OpenAi, ProviderKind::Claude))
        .await
        .unwrap_err();

    match err {
        ProviderError::FallbackExhausted { primary, fallback } => {
            assert!(primary.to_string().contains("primary down"));
            assert!(fallback.to_string().contains("fallback down"));
        }
        other => panic!("expected FallbackExhausted, got {other:?}"),
    }
    assert_eq!(openai.calls(), 1);
    assert_eq!(claude.calls(), 1);
}

#[tokio::test]
async fn test_no_fallback_to_same_provider() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::failing(ProviderKind::OpenAi, &metrics, "down");
    let orch = orchestrator(&[openai.clone()], ProviderKind::OpenAi, &metrics);

    let err = orch
        .generate_training_content(&with_fallback("Forklift safety", ProviderKind::OpenAi, ProviderKind::OpenAi))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Upstream { provider: ProviderKind::OpenAi, .. }));
    assert_eq!(openai.calls(), 1);
}

#[tokio::test]
async fn test_fallback_disabled_returns_primary_error() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::failing(ProviderKind::OpenAi, &metrics, "down");
    let claude = Mock::ok(ProviderKind::Claude, &metrics, "unused");
    let orch = orchestrator(&[openai, claude.clone()], ProviderKind::OpenAi, &metrics);

    let mut req = with_fallback("Forklift safety", ProviderKind::OpenAi, ProviderKind::Claude);
    req.options.enable_fallback = false;
    assert!(orch.generate_training_content(&req).await.is_err());
    assert_eq!(claude.calls(), 0);
}

#[tokio::test]
async fn test_default_provider_serves_training() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, "from openai");
    let grok = Mock::ok(ProviderKind::Grok, &metrics, "from grok");
    let orch = orchestrator(&[openai.clone(), grok.clone()], ProviderKind::Grok, &metrics);

    let result = orch.generate_training_content(&request("Pallet jacks")).await.unwrap();
    assert_eq!(result.provider, ProviderKind::Grok);
    assert_eq!(openai.calls(), 0);
}

#[tokio::test]
async fn test_blank_prompt_is_rejected_before_dispatch() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, "x");
    let orch = orchestrator(&[openai.clone()], ProviderKind::OpenAi, &metrics);

    let err = orch.generate_training_content(&request("   ")).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest(_)));
    assert!(matches!(
        orch.translate_content("Hello", "", None).await,
        Err(ProviderError::InvalidRequest(_))
    ));
    assert!(matches!(
        orch.generate_quiz("Some content", 0, None).await,
        Err(ProviderError::InvalidRequest(_))
    ));
    assert!(matches!(
        orch.generate_safety_content("", &GenerationContext::default(), &GenerationOptions::default())
            .await,
        Err(ProviderError::InvalidRequest(_))
    ));
    assert_eq!(openai.calls(), 0);
    assert_eq!(metrics.all_metrics().total_requests, 0);
}

#[tokio::test]
async fn test_unregistered_provider_is_configuration_error() {
    let metrics = Arc::new(MetricsCollector::new());
    let orch = orchestrator(&[], ProviderKind::OpenAi, &metrics);
    let err = orch.generate_training_content(&request("Pallet jacks")).await.unwrap_err();
    assert!(matches!(err, ProviderError::Configuration { provider: ProviderKind::OpenAi, .. }));
}

#[tokio::test]
async fn test_training_document_parses_output() {
    let metrics = Arc::new(MetricsCollector::new());
    let fenced = format!("Here you go:\n```json\n{DOCUMENT}\n```");
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, &fenced);
    let orch = orchestrator(&[openai], ProviderKind::OpenAi, &metrics);

    let generated = orch.generate_training_document(&request("Lockout")).await.unwrap();
    assert!(!generated.degraded);
    assert!(!generated.partial);
    assert_eq!(generated.provider, ProviderKind::OpenAi);
    assert_eq!(generated.model, "mock-1");
    assert_eq!(generated.usage.total_tokens, 30);
    assert_eq!(generated.document.training.introduction(), "Lockout basics");
    assert_eq!(generated.document.training.sections()[0].key_points(), vec!["Verify zero energy"]);
}

#[tokio::test]
async fn test_unparseable_output_degrades() {
    let metrics = Arc::new(MetricsCollector::new());
    let prose = "Always wear gloves near the press. Never bypass guards.";
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, prose);
    let orch = orchestrator(&[openai], ProviderKind::OpenAi, &metrics);

    let generated = orch.generate_training_document(&request("Press safety")).await.unwrap();
    assert!(generated.degraded);
    let training = &generated.document.training;
    assert_eq!(training.introduction(), prose);
    let sections = training.sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title(), "Generated Content");
    assert_eq!(sections[0].content(), prose);
    assert_eq!(training.best_practices(), vec!["Review documentation before starting"]);
    assert_eq!(training.common_mistakes(), vec!["Not following documented procedures"]);
    assert!(generated.document.quiz.is_empty());
}

#[tokio::test]
async fn test_sop_defaults_to_openai_native() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, "sop body");
    let gemini = Mock::ok(ProviderKind::Gemini, &metrics, "unused");
    let orch = orchestrator(&[openai.clone(), gemini.clone()], ProviderKind::Gemini, &metrics);

    let result = orch.generate_sop(&request("Changeover on line 3")).await.unwrap();
    assert_eq!(result.provider, ProviderKind::OpenAi);
    assert!(openai.last_prompt().contains("native sop: Changeover on line 3"));
    assert_eq!(gemini.calls(), 0);
}

#[tokio::test]
async fn test_sop_without_native_support_uses_training_path() {
    let metrics = Arc::new(MetricsCollector::new());
    let llama = Mock::ok(ProviderKind::Llama, &metrics, "sop via training");
    let orch = orchestrator(&[llama.clone()], ProviderKind::OpenAi, &metrics);

    let mut req = request("Changeover on line 3");
    req.options.provider = Some(ProviderKind::Llama);
    let result = orch.generate_sop(&req).await.unwrap();
    assert_eq!(result.content, "sop via training");
    let prompt = llama.last_prompt();
    assert!(prompt.contains("Changeover on line 3"));
    assert!(!prompt.contains("native sop"));
}

#[tokio::test]
async fn test_sop_falls_back_between_providers() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::failing(ProviderKind::OpenAi, &metrics, "down");
    let gemini = Mock::ok(ProviderKind::Gemini, &metrics, "gemini sop");
    let orch = orchestrator(&[openai, gemini], ProviderKind::OpenAi, &metrics);

    let result = orch
        .generate_sop(&with_fallback("Changeover", ProviderKind::OpenAi, ProviderKind::Gemini))
        .await
        .unwrap();
    assert_eq!(result.provider, ProviderKind::Gemini);
}

#[tokio::test]
async fn test_safety_prefers_claude_and_falls_back_to_training() {
    let metrics = Arc::new(MetricsCollector::new());
    let claude = Mock::ok(ProviderKind::Claude, &metrics, "unused");
    let gemini = Mock::ok(ProviderKind::Gemini, &metrics, "safety via training");
    let orch = orchestrator(&[claude, gemini.clone()], ProviderKind::OpenAi, &metrics);
    let ctx = GenerationContext::default();

    let native = orch
        .generate_safety_content("Chemical spill", &ctx, &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(native, "native safety: Chemical spill");

    let options = GenerationOptions {
        provider: Some(ProviderKind::Gemini),
        ..Default::default()
    };
    let text = orch.generate_safety_content("Chemical spill", &ctx, &options).await.unwrap();
    assert_eq!(text, "safety via training");
    assert!(gemini.last_prompt().contains("Chemical spill"));
}

#[tokio::test]
async fn test_analysis_routing() {
    let metrics = Arc::new(MetricsCollector::new());
    let claude = Mock::ok(ProviderKind::Claude, &metrics, "unused");
    let llama = Mock::ok(ProviderKind::Llama, &metrics, "unused");
    let orch = orchestrator(&[claude, llama], ProviderKind::OpenAi, &metrics);
    let employee = json!({"name": "Dana", "completedModules": 4});

    let analysis = orch.analyze_employee_performance(&employee, None).await.unwrap();
    assert_eq!(analysis, "analysis of Dana");

    let err = orch
        .analyze_employee_performance(&employee, Some(ProviderKind::Llama))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Unsupported { provider: ProviderKind::Llama, .. }));
}

#[tokio::test]
async fn test_embeddings_always_use_openai() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, "unused");
    let claude = Mock::ok(ProviderKind::Claude, &metrics, "unused");
    let orch = orchestrator(&[openai, claude], ProviderKind::Claude, &metrics);

    let texts = vec!["abc".to_string(), "de".to_string()];
    let items = orch.generate_embeddings(&texts).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].embedding, vec![3.0]);
    assert_eq!(items[1].index, 1);

    assert!(orch.generate_embeddings(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quiz_and_translation_use_default() {
    let metrics = Arc::new(MetricsCollector::new());
    let quiz = r#"[{"question":"Q?","options":["a","b","c","d"],"correctAnswer":2,"explanation":"c"}]"#;
    let gemini = Mock::ok(ProviderKind::Gemini, &metrics, quiz);
    let orch = orchestrator(&[gemini.clone()], ProviderKind::Gemini, &metrics);

    let questions = orch.generate_quiz("Forklift content", 1, None).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_answer(), 2);
    assert!(gemini.last_prompt().contains("exactly 1"));

    let translated = orch.translate_content("Hello", "es", None).await.unwrap();
    assert_eq!(translated, quiz);
}

#[tokio::test]
async fn test_health_check_all_reports_each_provider() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, "ok");
    let grok = Mock::failing(ProviderKind::Grok, &metrics, "HTTP 401: bad key");
    let orch = orchestrator(&[openai, grok], ProviderKind::OpenAi, &metrics);

    let reports = orch.health_check_all().await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[&ProviderKind::OpenAi].status, HealthStatus::Healthy);
    assert_eq!(reports[&ProviderKind::Grok].status, HealthStatus::Unhealthy);
    assert!(reports[&ProviderKind::Grok]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("bad key"));

    assert_eq!(metrics.all_metrics().total_requests, 0);
    assert!(orch.health_check(ProviderKind::Llama).await.is_err());
}

#[tokio::test]
async fn test_listing_and_recommendations() {
    let metrics = Arc::new(MetricsCollector::new());
    let openai = Mock::ok(ProviderKind::OpenAi, &metrics, "ok");
    let gemini = Mock::ok(ProviderKind::Gemini, &metrics, "ok");
    let orch = orchestrator(&[gemini, openai], ProviderKind::Gemini, &metrics);

    let listing = orch.list_providers();
    assert_eq!(listing.providers, vec![ProviderKind::OpenAi, ProviderKind::Gemini]);
    assert_eq!(listing.default, ProviderKind::Gemini);
    assert!(listing.capabilities[&ProviderKind::Gemini].vision);

    assert_eq!(orch.recommend_provider("vision"), ProviderKind::Gemini);
    assert_eq!(orch.recommend_provider("interpretive-dance"), ProviderKind::Gemini);
}
