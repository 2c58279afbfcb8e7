//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup (environment variables, optionally
//! seeded from a `.env` file) into an immutable [`Config`] that is then shared
//! by reference with every component that needs it.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Default Coveo answer configuration identifier.
pub const DEFAULT_ANSWER_CONFIG_ID: &str = "default";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Coveo platform credentials and request settings.
    pub coveo: CoveoConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Coveo platform configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct CoveoConfig {
    /// API key or OAuth token sent as the bearer credential.
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Coveo organization identifier.
    pub organization_id: String,

    /// Answer configuration used by the generative answer endpoint.
    pub answer_config_id: String,

    /// Platform base URL. When unset, derived from the organization id.
    pub base_url: Option<String>,

    /// Locale sent with search and passage requests.
    pub locale: String,

    /// Timezone sent with search and passage requests.
    pub timezone: String,

    /// Timeout for search and passage calls, in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for answer generation calls, in seconds.
    pub answer_timeout_secs: u64,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CoveoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoveoConfig")
            .field(
                "api_key",
                &if self.api_key.is_empty() {
                    "[UNSET]"
                } else {
                    "[REDACTED]"
                },
            )
            .field("organization_id", &self.organization_id)
            .field("answer_config_id", &self.answer_config_id)
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .field("timezone", &self.timezone)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("answer_timeout_secs", &self.answer_timeout_secs)
            .finish()
    }
}

impl Default for CoveoConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization_id: String::new(),
            answer_config_id: DEFAULT_ANSWER_CONFIG_ID.to_string(),
            base_url: None,
            locale: "en-US".to_string(),
            timezone: "America/New_York".to_string(),
            request_timeout_secs: 30,
            answer_timeout_secs: 60,
        }
    }
}

impl CoveoConfig {
    /// Base URL of the platform, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.org.coveo.com", self.organization_id),
        }
    }

    /// Search API endpoint.
    pub fn search_endpoint(&self) -> String {
        format!(
            "{}/rest/search/v3?organizationId={}",
            self.base_url(),
            self.organization_id
        )
    }

    /// Passage retrieval endpoint.
    pub fn passages_endpoint(&self) -> String {
        format!("{}/rest/search/v3/passages/retrieve", self.base_url())
    }

    /// Generative answer endpoint for the configured answer config.
    pub fn answer_endpoint(&self) -> String {
        format!(
            "{}/rest/organizations/{}/answer/v1/configs/{}/generate",
            self.base_url(),
            self.organization_id,
            self.answer_config_id
        )
    }

    /// OAuth tokens start with a single `x`; API keys start with `xx`.
    pub fn uses_oauth_token(&self) -> bool {
        self.api_key.starts_with('x') && !self.api_key.starts_with("xx")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.answer_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "coveo-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            coveo: CoveoConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = non_empty("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = non_empty("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_lookup(&lookup);

        if let Some(api_key) = non_empty("COVEO_API_KEY") {
            config.coveo.api_key = api_key.trim().to_string();
        }

        if let Some(org_id) = non_empty("COVEO_ORGANIZATION_ID") {
            config.coveo.organization_id = org_id.trim().to_string();
        }

        if let Some(config_id) = non_empty("COVEO_ANSWER_CONFIG_ID") {
            config.coveo.answer_config_id = config_id.trim().to_string();
        }

        if let Some(base_url) = non_empty("COVEO_BASE_URL") {
            info!("Using Coveo base URL override: {}", base_url);
            config.coveo.base_url = Some(base_url);
        }

        if let Some(locale) = non_empty("COVEO_LOCALE") {
            config.coveo.locale = locale;
        }

        if let Some(timezone) = non_empty("COVEO_TIMEZONE") {
            config.coveo.timezone = timezone;
        }

        if let Some(secs) = non_empty("COVEO_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.coveo.request_timeout_secs = secs,
                _ => warn!("Ignoring invalid COVEO_TIMEOUT_SECS value: {}", secs),
            }
        }

        if let Some(secs) = non_empty("COVEO_ANSWER_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.coveo.answer_timeout_secs = secs,
                _ => warn!("Ignoring invalid COVEO_ANSWER_TIMEOUT_SECS value: {}", secs),
            }
        }

        config
    }

    /// Check that the credentials required to reach Coveo are present.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.coveo.api_key.is_empty() {
            missing.push("COVEO_API_KEY");
        }
        if self.coveo.organization_id.is_empty() {
            missing.push("COVEO_ORGANIZATION_ID");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("COVEO_API_KEY", "xx-test-key"),
            ("COVEO_ORGANIZATION_ID", "acme"),
            ("COVEO_ANSWER_CONFIG_ID", "cfg-1"),
        ]));
        assert_eq!(config.coveo.api_key, "xx-test-key");
        assert_eq!(config.coveo.organization_id, "acme");
        assert_eq!(config.coveo.answer_config_id, "cfg-1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_answer_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.coveo.answer_config_id, "default");
        assert_eq!(config.coveo.locale, "en-US");
        assert_eq!(config.coveo.timezone, "America/New_York");
        assert_eq!(config.coveo.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.coveo.answer_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = Config::from_lookup(lookup_from(&[("COVEO_API_KEY", "   ")]));
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("COVEO_API_KEY"));
        assert!(err.contains("COVEO_ORGANIZATION_ID"));
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config = Config::from_lookup(lookup_from(&[
            ("COVEO_TIMEOUT_SECS", "abc"),
            ("COVEO_ANSWER_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.coveo.request_timeout_secs, 30);
        assert_eq!(config.coveo.answer_timeout_secs, 5);
    }

    #[test]
    fn test_endpoints() {
        let config = Config::from_lookup(lookup_from(&[
            ("COVEO_API_KEY", "xx-key"),
            ("COVEO_ORGANIZATION_ID", "acme"),
        ]));
        assert_eq!(
            config.coveo.search_endpoint(),
            "https://acme.org.coveo.com/rest/search/v3?organizationId=acme"
        );
        assert_eq!(
            config.coveo.passages_endpoint(),
            "https://acme.org.coveo.com/rest/search/v3/passages/retrieve"
        );
        assert_eq!(
            config.coveo.answer_endpoint(),
            "https://acme.org.coveo.com/rest/organizations/acme/answer/v1/configs/default/generate"
        );
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("COVEO_ORGANIZATION_ID", "acme"),
            ("COVEO_BASE_URL", "http://localhost:9999/"),
        ]));
        assert_eq!(config.coveo.base_url(), "http://localhost:9999");
    }

    #[test]
    fn test_oauth_token_detection() {
        let mut coveo = CoveoConfig::default();
        coveo.api_key = "x1234-oauth".to_string();
        assert!(coveo.uses_oauth_token());
        coveo.api_key = "xx1234-apikey".to_string();
        assert!(!coveo.uses_oauth_token());
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let mut coveo = CoveoConfig::default();
        coveo.api_key = "super_secret_key".to_string();
        let debug_str = format!("{:?}", coveo);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }
}
