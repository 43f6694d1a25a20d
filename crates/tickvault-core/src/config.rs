//! Provider configuration loaded from the environment.
//!
//! | Variable | Used by | Required |
//! |----------|---------|----------|
//! | `FINANCIAL_MODELING_PREP_API_KEY` | [`FmpConfig`] | yes |
//! | `TICKVAULT_FMP_BASE_URL` | [`FmpConfig`] | no |
//! | `FINANCIAL_DATASETS_API_KEY` | [`LineItemConfig`] | no |
//! | `TICKVAULT_LINE_ITEMS_BASE_URL` | [`LineItemConfig`] | no |
//! | `TICKVAULT_HTTP_TIMEOUT_MS` | both | no |
//!
//! A `.env` file in the working directory is loaded first when present.

use std::env;
use std::fmt::{Debug, Formatter};

use thiserror::Error;

use crate::http_client::DEFAULT_TIMEOUT_MS;

pub const FMP_API_KEY_ENV: &str = "FINANCIAL_MODELING_PREP_API_KEY";
pub const FMP_BASE_URL_ENV: &str = "TICKVAULT_FMP_BASE_URL";
pub const LINE_ITEMS_API_KEY_ENV: &str = "FINANCIAL_DATASETS_API_KEY";
pub const LINE_ITEMS_BASE_URL_ENV: &str = "TICKVAULT_LINE_ITEMS_BASE_URL";
pub const HTTP_TIMEOUT_ENV: &str = "TICKVAULT_HTTP_TIMEOUT_MS";

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/stable";
pub const DEFAULT_LINE_ITEMS_BASE_URL: &str = "https://api.financialdatasets.ai";
pub const DEFAULT_NEWS_PAGE_LIMIT: usize = 250;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    Missing { name: &'static str },
    #[error("environment variable {name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the market-data provider client.
#[derive(Clone, PartialEq, Eq)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub news_page_limit: usize,
}

impl FmpConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_FMP_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            news_page_limit: DEFAULT_NEWS_PAGE_LIMIT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let api_key = non_empty_var(FMP_API_KEY_ENV).ok_or(ConfigError::Missing {
            name: FMP_API_KEY_ENV,
        })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty_var(FMP_BASE_URL_ENV) {
            config.base_url = base_url;
        }
        config.timeout_ms = timeout_from_env()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_news_page_limit(mut self, limit: usize) -> Self {
        self.news_page_limit = limit.max(1);
        self
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Debug for FmpConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FmpConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("news_page_limit", &self.news_page_limit)
            .finish()
    }
}

/// Settings for the line-item search service.
#[derive(Clone, PartialEq, Eq)]
pub struct LineItemConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for LineItemConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: String::from(DEFAULT_LINE_ITEMS_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl LineItemConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Ok(Self {
            api_key: non_empty_var(LINE_ITEMS_API_KEY_ENV),
            base_url: non_empty_var(LINE_ITEMS_BASE_URL_ENV)
                .unwrap_or_else(|| String::from(DEFAULT_LINE_ITEMS_BASE_URL)),
            timeout_ms: timeout_from_env()?,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn search_url(&self) -> String {
        format!(
            "{}/financials/search/line-items",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Debug for LineItemConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineItemConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn timeout_from_env() -> Result<u64, ConfigError> {
    match non_empty_var(HTTP_TIMEOUT_ENV) {
        None => Ok(DEFAULT_TIMEOUT_MS),
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|timeout| *timeout > 0)
            .ok_or(ConfigError::Invalid {
                name: HTTP_TIMEOUT_ENV,
                value,
            }),
    }
}
