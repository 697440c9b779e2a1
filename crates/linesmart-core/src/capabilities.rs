//! Static capability matrix and task recommendations.
//!
//! Introspection only: dispatch never consults this table.

use linesmart_provider::ProviderKind;
use serde::Serialize;

/// What a provider advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub training_content: bool,
    pub quiz: bool,
    pub translation: bool,
    pub embeddings: bool,
    pub analysis: bool,
    pub safety: bool,
    pub vision: bool,
}

impl Capabilities {
    const TEXT_ONLY: Capabilities = Capabilities {
        training_content: true,
        quiz: true,
        translation: true,
        embeddings: false,
        analysis: false,
        safety: false,
        vision: false,
    };
}

/// A provider name with its capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub name: ProviderKind,
    pub capabilities: Capabilities,
}

/// Capability flags for `kind`.
pub fn capabilities(kind: ProviderKind) -> Capabilities {
    let base = Capabilities::TEXT_ONLY;
    match kind {
        ProviderKind::OpenAi => Capabilities {
            embeddings: true,
            ..base
        },
        ProviderKind::Claude => Capabilities {
            analysis: true,
            safety: true,
            ..base
        },
        ProviderKind::Gemini => Capabilities {
            analysis: true,
            vision: true,
            ..base
        },
        ProviderKind::Grok => Capabilities {
            analysis: true,
            ..base
        },
        ProviderKind::Llama => base,
    }
}

/// Descriptor for every provider, in registration order.
pub fn descriptors() -> Vec<ProviderDescriptor> {
    ProviderKind::ALL
        .iter()
        .map(|&name| ProviderDescriptor {
            name,
            capabilities: capabilities(name),
        })
        .collect()
}

/// Recommended provider for a task type, or `None` for unrecognized tasks.
pub fn recommend(task_type: &str) -> Option<ProviderKind> {
    match task_type {
        "trainingContent" | "quiz" | "translation" | "embeddings" | "analysis" | "safety"
        | "speed" => Some(ProviderKind::OpenAi),
        "vision" => Some(ProviderKind::Gemini),
        "cost" => Some(ProviderKind::Llama),
        _ => None,
    }
}
