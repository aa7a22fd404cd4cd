//! Run configuration.
//!
//! The YAML file is read once at startup, CLI overrides are applied, and the
//! result is validated into an [`AppConfig`] that is passed by reference to
//! every stage. Missing keywords, tags or history window are reported here,
//! before any request is made.
//!
//! ```yaml
//! keywords: ["diffusion models", "vision transformer"]   # or a single string
//! tags: ["cs.CV", "cs.LG"]
//! history_days: 3
//! feed:
//!   api_base: "http://export.arxiv.org/api/query"
//!   max_pages: 100
//! telegram:
//!   bot_token: "123:abc"
//!   chat_ids: [123456, "@channel"]                       # or a single value
//! ```

use crate::error::ConfigError;
use crate::feed::fetcher::{DEFAULT_API_BASE, DEFAULT_MAX_PAGES};
use crate::models::{Keyword, TagFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub keywords: Vec<Keyword>,
    pub tags: TagFilter,
    pub history_days: u32,
    pub feed: FeedConfig,
    /// Present whenever delivery is enabled.
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub api_base: String,
    pub max_pages: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_ids: Vec<String>,
    pub api_base: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_ids", &self.chat_ids)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub telegram_bot_token: Option<String>,
    /// Whether the telegram section must be complete.
    pub require_delivery: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(vs) => vs,
        }
    }
}

/// Chat ids are numeric for users and groups, `@name` for channels.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatId {
    Numeric(i64),
    Name(String),
}

impl From<ChatId> for String {
    fn from(id: ChatId) -> Self {
        match id {
            ChatId::Numeric(n) => n.to_string(),
            ChatId::Name(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    keywords: Option<OneOrMany<String>>,
    tags: Option<OneOrMany<String>>,
    history_days: Option<u32>,
    #[serde(default)]
    feed: FeedConfig,
    telegram: Option<RawTelegram>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTelegram {
    bot_token: Option<String>,
    chat_ids: Option<OneOrMany<ChatId>>,
    api_base: Option<String>,
}

impl AppConfig {
    /// Read and validate the YAML file at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - YAML configuration file
    /// * `overrides` - Command-line values applied on top of the file
    ///
    /// # Returns
    ///
    /// The validated configuration, or a [`ConfigError`] naming the first
    /// missing or invalid value. No network request is made either way.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw, overrides)?;
        info!(
            keywords = config.keywords.len(),
            tags = config.tags.len(),
            history_days = config.history_days,
            delivery = config.telegram.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        Self::validate(raw, overrides)
    }

    fn validate(raw: RawConfig, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let keywords = non_blank_list(raw.keywords, "keywords")?;
        let tags = TagFilter::new(non_blank_list(raw.tags, "tags")?);

        let history_days = raw.history_days.ok_or(ConfigError::Missing("history_days"))?;
        if history_days == 0 {
            return Err(ConfigError::Invalid("history_days must be at least 1".to_string()));
        }
        if raw.feed.max_pages == 0 {
            return Err(ConfigError::Invalid("feed.max_pages must be at least 1".to_string()));
        }

        let telegram = if overrides.require_delivery {
            Some(telegram_config(raw.telegram.unwrap_or_default(), overrides)?)
        } else {
            None
        };

        Ok(Self {
            keywords,
            tags,
            history_days,
            feed: raw.feed,
            telegram,
        })
    }
}

fn non_blank_list(
    values: Option<OneOrMany<String>>,
    field: &'static str,
) -> Result<Vec<String>, ConfigError> {
    let values: Vec<String> = values
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .collect();
    if values.is_empty() {
        return Err(ConfigError::Missing(field));
    }
    if values.iter().any(String::is_empty) {
        return Err(ConfigError::Invalid(format!("{field} must not contain empty values")));
    }
    Ok(values)
}

fn telegram_config(raw: RawTelegram, overrides: &ConfigOverrides) -> Result<TelegramConfig, ConfigError> {
    let bot_token = overrides
        .telegram_bot_token
        .clone()
        .or(raw.bot_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::Missing("telegram.bot_token"))?;

    let chat_ids: Vec<String> = raw
        .chat_ids
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(String::from)
        .filter(|id| !id.trim().is_empty())
        .collect();
    if chat_ids.is_empty() {
        return Err(ConfigError::Missing("telegram.chat_ids"));
    }

    Ok(TelegramConfig {
        bot_token,
        chat_ids,
        api_base: raw
            .api_base
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
    })
}
