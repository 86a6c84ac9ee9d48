//! Bot configuration from the process environment

use crate::runtime::{AllowList, RuntimeSettings};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Largest media group the platform accepts
pub const PLATFORM_MEDIA_BATCH_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment: {0}")]
    Env(#[from] envy::Error),
    #[error("BOT_TOKEN must not be blank")]
    BlankToken,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Comma-separated operator ids, kept raw so bad entries can be skipped
    #[serde(default)]
    pub admin_ids: Option<String>,

    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    #[serde(default = "default_max_media_batch")]
    pub max_media_batch: usize,
    #[serde(default = "default_enrich_timeout_secs")]
    pub enrich_timeout_secs: u64,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of variables
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let config: BotConfig = envy::from_iter(vars)?;
        if config.bot_token.trim().is_empty() {
            return Err(ConfigError::BlankToken);
        }
        Ok(config)
    }

    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            max_message_len: self.max_message_len.max(1),
            max_media_batch: self.max_media_batch.clamp(1, PLATFORM_MEDIA_BATCH_LIMIT),
            enrich_timeout: Duration::from_secs(self.enrich_timeout_secs),
            idle_timeout: (self.session_idle_secs > 0)
                .then(|| Duration::from_secs(self.session_idle_secs)),
        }
    }

    /// Operator allow-list; unparsable entries are skipped
    pub fn allow_list(&self) -> AllowList {
        let raw = self.admin_ids.as_deref().unwrap_or_default();
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match entry.parse::<i64>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(entry, error = %e, "Skipping invalid ADMIN_IDS entry");
                    None
                }
            });
        AllowList::new(ids)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn default_max_message_len() -> usize {
    4096
}

fn default_max_media_batch() -> usize {
    PLATFORM_MEDIA_BATCH_LIMIT
}

fn default_enrich_timeout_secs() -> u64 {
    10
}

fn default_session_idle_secs() -> u64 {
    24 * 60 * 60
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}
