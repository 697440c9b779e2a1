//! linesmart-core: provider selection, fallback, and configuration.

pub mod capabilities;
pub mod config;
mod error;
pub mod orchestrator;
pub mod registry;

pub use capabilities::{Capabilities, ProviderDescriptor};
pub use config::{Config, ConfigStore, Settings};
pub use error::ConfigError;
pub use orchestrator::{Attempts, GeneratedTraining, Orchestrator, ProviderListing};
pub use registry::ProviderRegistry;
