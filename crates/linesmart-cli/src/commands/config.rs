//! `linesmart config`: edit the stored config file.

use super::print_json;
use crate::cli::ConfigAction;
use linesmart_core::{Config, ConfigStore};
use tracing::info;

pub fn run(store: &ConfigStore, action: &ConfigAction) -> anyhow::Result<()> {
    let mut config = store.load();
    match action {
        ConfigAction::Show => print_json(&masked(&config)),
        ConfigAction::SetKey { prefix, key } => {
            config.api_keys.insert(prefix.to_lowercase(), key.clone());
            store.save(&config)?;
            info!(prefix = %prefix.to_lowercase(), path = %store.path().display(), "Saved API key");
            Ok(())
        }
        ConfigAction::SetDefault { name } => {
            config.default_provider = name.to_string();
            store.save(&config)?;
            info!(provider = %name, "Default provider set");
            Ok(())
        }
    }
}

/// Copy of `config` with every key reduced to its last four characters.
fn masked(config: &Config) -> Config {
    let mut masked = config.clone();
    for key in masked.api_keys.values_mut() {
        let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        *key = format!("****{tail}");
    }
    masked
}
