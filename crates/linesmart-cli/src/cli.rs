//! CLI argument and command definitions.

use clap::{Args, Parser, Subcommand};
use linesmart_provider::ProviderKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "linesmart", version, about = "LineSmart AI provider orchestration")]
pub struct Cli {
    /// Provider to use (defaults to the task default, then DEFAULT_AI_PROVIDER).
    #[arg(long, global = true)]
    pub provider: Option<ProviderKind>,

    /// Model override for generation requests.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Provider to retry once with when the primary fails.
    #[arg(long, global = true)]
    pub fallback: Option<ProviderKind>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate structured training content.
    Generate {
        /// What the training should cover.
        prompt: String,

        /// Print the raw model output instead of the parsed document.
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Generate a standard operating procedure.
    Sop {
        /// The procedure to document.
        prompt: String,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Generate multiple-choice questions from training content.
    Quiz {
        #[command(flatten)]
        input: InputArgs,

        /// Number of questions.
        #[arg(short, long, default_value = "5")]
        count: usize,
    },

    /// Translate training content.
    Translate {
        #[command(flatten)]
        input: InputArgs,

        /// Target language code or name (e.g. `es`).
        #[arg(long = "to")]
        target_language: String,
    },

    /// Analyze employee performance data given as JSON.
    Analyze {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Generate safety training for a scenario.
    Safety {
        /// The hazard or situation to train for.
        scenario: String,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Compute embeddings (always OpenAI).
    Embed {
        /// Texts to embed.
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// List providers, their capabilities and the default.
    Providers,

    /// Probe one provider, or all of them.
    Health {
        #[arg(value_name = "PROVIDER")]
        target: Option<ProviderKind>,
    },

    /// Recommend a provider for a task type.
    Recommend {
        /// e.g. `quiz`, `vision`, `cost`.
        task: String,
    },

    /// Show request metrics collected by this process.
    Metrics {
        /// Provider name; omit for the full report.
        #[arg(value_name = "PROVIDER")]
        target: Option<String>,
    },

    /// Summarize provider health from collected metrics.
    HealthSummary,

    /// Manage ~/.linesmart/config.json.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Source text given inline or read from a file.
#[derive(Args)]
pub struct InputArgs {
    /// Inline content.
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub content: Option<String>,

    /// Read content from a file.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Company documents and employee profile to ground generation.
#[derive(Args, Default)]
pub struct ContextArgs {
    /// Context document; repeat for several.
    #[arg(long = "doc")]
    pub documents: Vec<PathBuf>,

    #[arg(long)]
    pub department: Option<String>,

    #[arg(long)]
    pub position: Option<String>,

    /// Employee language code.
    #[arg(long)]
    pub language: Option<String>,

    /// beginner, intermediate or advanced.
    #[arg(long)]
    pub experience: Option<String>,

    /// Extra requirements appended to the prompt.
    #[arg(long)]
    pub requirements: Option<String>,
}

#[derive(Args, Default)]
pub struct TuningArgs {
    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f32>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the stored config with keys masked.
    Show,
    /// Store an API key under a credential prefix (openai, anthropic, google, xai, replicate).
    SetKey { prefix: String, key: String },
    /// Store the default provider.
    SetDefault {
        #[arg(value_name = "PROVIDER")]
        name: ProviderKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_provider_flag_is_case_insensitive() {
        let cli = Cli::try_parse_from(["linesmart", "--provider", "Claude", "providers"]).unwrap();
        assert_eq!(cli.provider, Some(ProviderKind::Claude));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = Cli::try_parse_from(["linesmart", "--provider", "mistral", "providers"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("openai, claude, gemini, grok, llama"));
    }

    #[test]
    fn test_quiz_defaults_to_five_questions() {
        let cli = Cli::try_parse_from(["linesmart", "quiz", "Forklift basics"]).unwrap();
        match cli.command {
            Commands::Quiz { input, count } => {
                assert_eq!(count, 5);
                assert_eq!(input.content.as_deref(), Some("Forklift basics"));
            }
            _ => panic!("expected quiz"),
        }
    }

    #[test]
    fn test_health_target_is_separate_from_global_provider() {
        let cli = Cli::try_parse_from(["linesmart", "health", "gemini"]).unwrap();
        assert!(cli.provider.is_none());
        assert!(matches!(
            cli.command,
            Commands::Health {
                target: Some(ProviderKind::Gemini)
            }
        ));
    }

    #[test]
    fn test_input_requires_content_or_file() {
        assert!(Cli::try_parse_from(["linesmart", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["linesmart", "analyze", "--file", "data.json"]).is_ok());
    }

    #[test]
    fn test_generate_collects_documents() {
        let cli = Cli::try_parse_from([
            "linesmart",
            "generate",
            "Lockout tagout",
            "--doc",
            "a.md",
            "--doc",
            "b.md",
            "--fallback",
            "gemini",
        ])
        .unwrap();
        assert_eq!(cli.fallback, Some(ProviderKind::Gemini));
        match cli.command {
            Commands::Generate { context, raw, .. } => {
                assert_eq!(context.documents.len(), 2);
                assert!(!raw);
            }
            _ => panic!("expected generate"),
        }
    }
}
