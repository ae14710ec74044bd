//! Environment-first configuration with builder overrides (SPEC_FULL.md
//! §4.M / §9), grounded on `opentelemetry-otlp`'s `env` helpers
//! (`OTEL_EXPORTER_OTLP_*` read once at exporter construction, overridable
//! by explicit builder calls).
use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "https://api.judgmentlabs.ai";

const ENV_API_KEY: &str = "JUDGMENT_API_KEY";
const ENV_ORG_ID: &str = "JUDGMENT_ORG_ID";
const ENV_API_URL: &str = "JUDGMENT_API_URL";

/// Resolved, validated configuration for one tracer. Built once at
/// `init_tracer`/`init_tracer_blocking` time; nothing re-reads the
/// environment afterward.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub org_id: String,
    pub api_url: String,
}

/// Builder-level overrides; any field left `None` falls back to its
/// environment variable, per SPEC_FULL.md §9 "Config: env-first with
/// builder overrides".
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    org_id: Option<String>,
    api_url: Option<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(ENV_API_KEY).ok())
            .ok_or(ConfigError::MissingApiKey)?;
        let org_id = self
            .org_id
            .or_else(|| std::env::var(ENV_ORG_ID).ok())
            .ok_or(ConfigError::MissingOrgId)?;
        let api_url = self
            .api_url
            .or_else(|| std::env::var(ENV_API_URL).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_url).map_err(|e| ConfigError::InvalidApiUrl(e.to_string()))?;

        Ok(Config {
            api_key,
            org_id,
            api_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_an_error() {
        let err = ConfigBuilder::new().org_id("org").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn explicit_overrides_skip_env() {
        let config = ConfigBuilder::new()
            .api_key("key")
            .org_id("org")
            .api_url("https://example.test")
            .build()
            .unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_url, "https://example.test");
    }

    #[test]
    fn default_api_url_is_used_when_unset() {
        let config = ConfigBuilder::new()
            .api_key("key")
            .org_id("org")
            .build()
            .unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
