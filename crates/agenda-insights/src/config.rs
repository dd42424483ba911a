//! Configuration for the agenda pipeline
//!
//! All location-dependent values (site path, document library, region,
//! discipline) live in an explicit map keyed by location id, resolved once
//! at startup and passed into the pipeline. Nothing is looked up ad hoc at
//! run time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Completion model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Document source configuration
    #[serde(default)]
    pub source: SourceConfig,
    /// Per-location settings, keyed by location id
    #[serde(default)]
    pub locations: HashMap<String, LocationConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("agenda_insights.db"),
        }
    }
}

/// Completion model configuration (Azure OpenAI chat deployment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Resource endpoint, e.g. "https://my-resource.openai.azure.com"
    pub endpoint: String,
    /// Deployment name
    pub deployment: String,
    /// API version query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// API key
    pub api_key: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token budget per extraction call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: "gpt-4o".to_string(),
            api_version: default_api_version(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_model_timeout() -> u64 {
    120
}

/// Document source configuration (Microsoft Graph)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Tenant host name, e.g. "contoso.sharepoint.com"
    pub tenant_domain: String,
    /// Directory (tenant) id for the token endpoint
    pub tenant_id: String,
    /// Application (client) id
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

fn default_source_timeout() -> u64 {
    60
}

/// Settings for one location (one city's document library)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Server-relative site path, e.g. "/sites/CityClerk"
    pub site_path: String,
    /// Document library (list) name holding agenda files
    pub library: String,
    /// Region attached to every extracted record
    #[serde(default)]
    pub region: String,
    /// Discipline attached to every extracted record
    #[serde(default)]
    pub discipline: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields without which no run can succeed.
    pub fn validate(&self) -> Result<()> {
        if self.model.endpoint.is_empty() {
            return Err(Error::Config("model.endpoint is required".to_string()));
        }
        if self.model.deployment.is_empty() {
            return Err(Error::Config("model.deployment is required".to_string()));
        }
        if self.model.api_key.is_empty() {
            return Err(Error::Config("model.api_key is required".to_string()));
        }
        if self.source.tenant_domain.is_empty() {
            return Err(Error::Config("source.tenant_domain is required".to_string()));
        }
        if self.source.tenant_id.is_empty()
            || self.source.client_id.is_empty()
            || self.source.client_secret.is_empty()
        {
            return Err(Error::Config(
                "source.tenant_id, source.client_id and source.client_secret are required"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for one location id, if configured.
    pub fn location(&self, location_id: &str) -> Option<&LocationConfig> {
        self.locations.get(location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.max_tokens, 2000);
        assert!(config.locations.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [database]
            path = "/var/lib/agenda/insights.db"

            [model]
            endpoint = "https://example.openai.azure.com"
            deployment = "gpt-4o"
            api_key = "secret"
            max_tokens = 1500

            [source]
            tenant_domain = "contoso.sharepoint.com"
            tenant_id = "tid"
            client_id = "cid"
            client_secret = "cs"

            [locations.allen]
            site_path = "/sites/AllenClerk"
            library = "Agendas"
            region = "North Texas"
            discipline = "Civil"

            [locations.plano]
            site_path = "/sites/PlanoClerk"
            library = "Council Documents"
        "#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.model.max_tokens, 1500);
        assert_eq!(config.model.api_version, "2024-06-01");

        let allen = config.location("allen").unwrap();
        assert_eq!(allen.region, "North Texas");
        assert_eq!(allen.discipline, "Civil");

        // Region/discipline default to empty when omitted
        let plano = config.location("plano").unwrap();
        assert_eq!(plano.region, "");
        assert_eq!(plano.discipline, "");

        assert!(config.location("frisco").is_none());
    }

    #[test]
    fn test_validate_rejects_missing_model_key() {
        let toml = r#"
            [model]
            endpoint = "https://example.openai.azure.com"
            deployment = "gpt-4o"
            api_key = ""

            [source]
            tenant_domain = "contoso.sharepoint.com"
            tenant_id = "tid"
            client_id = "cid"
            client_secret = "cs"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }
}
