use crate::error::ConfigError;
use linesmart_provider::providers::anthropic::AnthropicSettings;
use linesmart_provider::providers::gemini::GeminiSettings;
use linesmart_provider::providers::grok::GrokSettings;
use linesmart_provider::providers::llama::LlamaSettings;
use linesmart_provider::providers::openai::OpenAiSettings;
use linesmart_provider::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Serialized settings from ~/.linesmart/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_provider: String,
    /// Keyed by credential prefix (`openai`, `anthropic`, `google`, `xai`, `replicate`).
    pub api_keys: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::OpenAi.to_string(),
            api_keys: HashMap::new(),
        }
    }
}

/// Helper struct for storing the location to read/write global settings
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".linesmart");
        path.push("config.json");
        Self { path }
    }

    /// Store rooted at an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the user's saved config, or fallback to Default
    pub fn load(&self) -> Config {
        if let Ok(content) = fs::read_to_string(&self.path) {
            match serde_json::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!(path = %self.path.display(), error = %e, "Ignoring unreadable config"),
            }
        }
        Config::default()
    }

    /// Save the user's config back to disk
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Export stored API keys as `<PREFIX>_API_KEY`, never overwriting the process env
    pub fn hydrate_env(&self) {
        let config = self.load();
        for (prefix, key) in config.api_keys.iter() {
            if !key.is_empty() {
                let env_var = format!("{}_API_KEY", prefix.to_uppercase());
                if std::env::var(&env_var).is_err() {
                    std::env::set_var(&env_var, key);
                }
            }
        }
    }
}

/// Resolved settings for every adapter plus the global default provider.
#[derive(Debug, Clone)]
pub struct Settings {
    pub default_provider: ProviderKind,
    pub openai: OpenAiSettings,
    pub claude: AnthropicSettings,
    pub gemini: GeminiSettings,
    pub grok: GrokSettings,
    pub llama: LlamaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::OpenAi,
            openai: OpenAiSettings::default(),
            claude: AnthropicSettings::default(),
            gemini: GeminiSettings::default(),
            grok: GrokSettings::default(),
            llama: LlamaSettings::default(),
        }
    }
}

impl Settings {
    /// Resolve from the process environment, falling back to `config`.
    pub fn from_env(config: &Config) -> Result<Self, ConfigError> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup. Environment values win over
    /// `config`; blank values count as unset.
    pub fn resolve<F>(config: &Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let key = |prefix: &str| {
            var(&format!("{}_API_KEY", prefix.to_uppercase()))
                .or_else(|| config.api_keys.get(prefix).filter(|k| !k.is_empty()).cloned())
        };
        let tokens = |name: &str, default: u32| parse_tokens(name, var(name), default);

        let default_provider = match var("DEFAULT_AI_PROVIDER") {
            Some(name) => ProviderKind::from_str(&name)?,
            None => ProviderKind::from_str(&config.default_provider)?,
        };

        let defaults = Settings::default();

        Ok(Self {
            default_provider,
            openai: OpenAiSettings {
                api_key: key("openai"),
                model: var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                max_tokens: tokens("OPENAI_MAX_TOKENS", defaults.openai.max_tokens),
                embedding_model: var("EMBEDDING_MODEL").unwrap_or(defaults.openai.embedding_model),
                base_url: defaults.openai.base_url,
            },
            claude: AnthropicSettings {
                api_key: key("anthropic"),
                model: var("ANTHROPIC_MODEL").unwrap_or(defaults.claude.model),
                max_tokens: tokens("ANTHROPIC_MAX_TOKENS", defaults.claude.max_tokens),
                base_url: defaults.claude.base_url,
            },
            gemini: GeminiSettings {
                api_key: key("google"),
                model: var("GOOGLE_MODEL").unwrap_or(defaults.gemini.model),
                max_tokens: tokens("GOOGLE_MAX_TOKENS", defaults.gemini.max_tokens),
                base_url: defaults.gemini.base_url,
            },
            grok: GrokSettings {
                api_key: key("xai"),
                model: var("XAI_MODEL").unwrap_or(defaults.grok.model),
                max_tokens: tokens("XAI_MAX_TOKENS", defaults.grok.max_tokens),
                base_url: var("XAI_BASE_URL").unwrap_or(defaults.grok.base_url),
            },
            llama: LlamaSettings {
                replicate_api_key: key("replicate"),
                model: var("LLAMA_MODEL"),
                max_tokens: tokens("LLAMA_MAX_TOKENS", defaults.llama.max_tokens),
                ollama_base_url: var("OLLAMA_BASE_URL").unwrap_or(defaults.llama.ollama_base_url),
            },
        })
    }
}

/// A token limit that does not parse as a positive integer keeps its default.
fn parse_tokens(name: &str, value: Option<String>, default: u32) -> u32 {
    let Some(value) = value else {
        return default;
    };
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            warn!(var = name, value = %value, default, "Ignoring invalid token limit");
            default
        }
    }
}
