// Localized messages
//
// A flat key -> text bundle. The English bundle is compiled in; a user TOML file may
// override any subset of keys. Unknown keys render as the key itself.

use anyhow::{Context, Result};
use log::{error, info};
use std::collections::HashMap;
use std::path::Path;

const BUILTIN: &str = include_str!("messages.toml");

#[derive(Debug, Clone, Default)]
pub struct Messages {
    entries: HashMap<String, String>,
}

impl Messages {
    pub fn builtin() -> Self {
        let entries = toml::from_str::<HashMap<String, String>>(BUILTIN).unwrap_or_else(|e| {
            error!("[PHASE: initialization] [STEP: i18n] Built-in messages did not parse: {}", e);
            HashMap::new()
        });
        Self { entries }
    }

    /// Built-in bundle overlaid with `overlay` when given.
    pub fn load(overlay: Option<&Path>) -> Result<Self> {
        let mut messages = Self::builtin();
        if let Some(path) = overlay {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read messages file {:?}", path))?;
            let extra: HashMap<String, String> = toml::from_str(&text)
                .with_context(|| format!("Invalid messages file {:?}", path))?;
            info!(
                "[PHASE: initialization] [STEP: i18n] Loaded {} message override(s) from {:?}",
                extra.len(),
                path
            );
            messages.entries.extend(extra);
        }
        Ok(messages)
    }

    pub fn get(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// `get` with `{0}`, `{1}`, ... replaced by `params`.
    pub fn format(&self, key: &str, params: &[&str]) -> String {
        let mut text = self.get(key);
        for (i, p) in params.iter().enumerate() {
            text = text.replace(&format!("{{{}}}", i), p);
        }
        text
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
