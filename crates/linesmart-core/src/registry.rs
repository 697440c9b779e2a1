//! Adapter registry, built once at startup and injected into the orchestrator.

use crate::config::Settings;
use linesmart_provider::providers::anthropic::AnthropicProvider;
use linesmart_provider::providers::gemini::GeminiProvider;
use linesmart_provider::providers::grok::GrokProvider;
use linesmart_provider::providers::llama::LlamaProvider;
use linesmart_provider::providers::openai::OpenAiProvider;
use linesmart_provider::{MetricsCollector, Provider, ProviderError, ProviderKind};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Adapters keyed by provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderKind, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every adapter from resolved settings, all reporting into `metrics`.
    pub fn from_settings(
        settings: &Settings,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiProvider::new(
            settings.openai.clone(),
            Arc::clone(&metrics),
        )?));
        registry.register(Arc::new(AnthropicProvider::new(
            settings.claude.clone(),
            Arc::clone(&metrics),
        )?));
        registry.register(Arc::new(GeminiProvider::new(
            settings.gemini.clone(),
            Arc::clone(&metrics),
        )?));
        registry.register(Arc::new(GrokProvider::new(
            settings.grok.clone(),
            Arc::clone(&metrics),
        )?));
        registry.register(Arc::new(LlamaProvider::new(settings.llama.clone(), metrics)?));
        Ok(registry)
    }

    /// Add or replace the adapter for its provider.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// The adapter for `kind`.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ProviderError::Configuration {
                provider: kind,
                message: "provider is not registered".to_string(),
            })
    }

    /// Registered providers, in [`ProviderKind::ALL`] order.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProviderKind, &Arc<dyn Provider>)> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
