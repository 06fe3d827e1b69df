//! Configuration and screen construction for a CLI invocation.

use anyhow::{Context as _, Result};
use tourdesk_business::{ApiClient, BusinessConfig};
use tracing::debug;

use crate::cli::Cli;

/// Environment configuration with command-line overrides applied.
pub fn business_config(cli: &Cli) -> Result<BusinessConfig> {
    let config = BusinessConfig::from_env().context("Failed to read TOURDESK_* configuration")?;
    Ok(apply_overrides(config, cli.api_url.as_deref(), cli.token.as_deref()))
}

fn apply_overrides(mut config: BusinessConfig, api_url: Option<&str>, token: Option<&str>) -> BusinessConfig {
    if let Some(url) = api_url {
        debug!(url, "API URL overridden on the command line");
        config.api_base_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(token) = token {
        config.api_token = Some(token.to_owned());
    }
    config
}

pub struct CliContext {
    pub config: BusinessConfig,
    pub client: ApiClient,
}

impl CliContext {
    pub fn new(config: BusinessConfig) -> Self {
        Self {
            client: ApiClient::new(&config),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_values() {
        let config = apply_overrides(
            BusinessConfig::default().with_token("from-env"),
            Some("https://admin.example.com/"),
            Some("from-flag"),
        );
        assert_eq!(config.api_base_url, "https://admin.example.com");
        assert_eq!(config.api_token(), Some("from-flag"));
    }

    #[test]
    fn missing_flags_keep_environment_values() {
        let config = apply_overrides(BusinessConfig::default().with_token("from-env"), None, None);
        assert_eq!(config, BusinessConfig::default().with_token("from-env"));
    }
}
