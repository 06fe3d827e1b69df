use std::time::Duration;

use log::info;
use serde::Deserialize;
use thiserror::Error;
use tourdesk_states::{ControllerConfig, DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE};
use ustr::Ustr;

/// Prefix of every environment variable read by [`BusinessConfig::from_env`].
pub const ENV_PREFIX: &str = "TOURDESK_";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Env(#[from] serde_env::Error),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    api_base_url: Option<String>,
    api_token: Option<String>,
    acting_user_id: Option<String>,
    page_size: Option<u32>,
    search_debounce_ms: Option<u64>,
}

/// Settings for talking to the admin API and driving the dashboard tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConfig {
    pub api_base_url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub api_token: Option<String>,
    /// Id of the administrator using the dashboard; their own row is never
    /// selectable.
    pub acting_user_id: Option<String>,
    pub page_size: u32,
    pub search_debounce: Duration,
}

impl BusinessConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_acting_user(mut self, id: impl Into<String>) -> Self {
        self.acting_user_id = Some(id.into());
        self
    }

    /// Reads `TOURDESK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading configuration from {ENV_PREFIX}* environment variables");
        Self::from_vars(std::env::vars())
    }

    /// Builds a config from `(name, value)` pairs, keeping only prefixed names.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefixed: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_owned(), value.as_ref().to_owned()))
            })
            .collect();
        let raw: RawConfig = serde_env::from_iter(prefixed)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let RawConfig {
            api_base_url,
            api_token,
            acting_user_id,
            page_size,
            search_debounce_ms,
        } = raw;

        let api_base_url = match api_base_url {
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    key: "TOURDESK_API_BASE_URL",
                    reason: "must not be empty".to_owned(),
                });
            }
            Some(url) => url.trim().trim_end_matches('/').to_owned(),
            None => {
                info!("TOURDESK_API_BASE_URL not set, defaulting to {DEFAULT_API_BASE_URL}");
                DEFAULT_API_BASE_URL.to_owned()
            }
        };

        let page_size = match page_size {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: "TOURDESK_PAGE_SIZE",
                    reason: "must be greater than zero".to_owned(),
                });
            }
            Some(size) => size,
            None => DEFAULT_PAGE_SIZE,
        };

        let search_debounce = search_debounce_ms.map_or(DEFAULT_DEBOUNCE, Duration::from_millis);

        Ok(Self {
            api_base_url,
            api_token: api_token.filter(|token| !token.is_empty()),
            acting_user_id: acting_user_id.filter(|id| !id.is_empty()),
            page_size,
            search_debounce,
        })
    }

    pub fn api_url(&self) -> Ustr {
        Ustr::from(&format!("{}/api", self.api_base_url))
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default()
            .with_debounce(self.search_debounce)
            .with_default_page_size(self.page_size)
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            api_token: None,
            acting_user_id: None,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_DEBOUNCE,
        }
    }
}
