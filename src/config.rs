//! Triage configuration parsing
//!
//! Loads the backend endpoints and logging defaults from YAML:
//!
//! ```yaml
//! taxonomy:
//!   base_url: "https://facilities.example.com/api/"
//!   tags_path: "incidence_tags"
//!   buildings_path: "buildings"
//!   timeout_secs: 30
//!   auth_token_env: INCIDENT_TRIAGE_TOKEN
//! logging:
//!   filter: "incident_triage=info"
//! ```

use serde::Deserialize;
use url::Url;

use crate::error::{Result, TriageError};

/// Default configuration path
pub const DEFAULT_CONFIG_PATH: &str = "config/incident_triage.yaml";

/// Environment variable overriding the configuration path
pub const CONFIG_PATH_ENV: &str = "INCIDENT_TRIAGE_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct TriageConfig {
    pub taxonomy: TaxonomyEndpointConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how to fetch the taxonomy and lookup lists
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyEndpointConfig {
    pub base_url: String,
    #[serde(default = "default_tags_path")]
    pub tags_path: String,
    #[serde(default = "default_buildings_path")]
    pub buildings_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding a bearer token, if any
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

fn default_tags_path() -> String {
    "incidence_tags".to_string()
}

fn default_buildings_path() -> String {
    "buildings".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "incident_triage=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl TaxonomyEndpointConfig {
    pub fn tags_url(&self) -> Result<Url> {
        self.join(&self.tags_path)
    }

    pub fn buildings_url(&self) -> Result<Url> {
        self.join(&self.buildings_path)
    }

    /// Bearer token read from the configured environment variable
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.trim().is_empty())
    }

    fn join(&self, path: &str) -> Result<Url> {
        // A base without a trailing slash would have its last segment replaced
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        let base = Url::parse(&base).map_err(|source| TriageError::Url {
            url: self.base_url.clone(),
            source,
        })?;
        base.join(path.trim_start_matches('/'))
            .map_err(|source| TriageError::Url {
                url: path.to_string(),
                source,
            })
    }
}

impl TriageConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TriageError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: TriageConfig =
            serde_yaml::from_str(content).map_err(|e| TriageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `INCIDENT_TRIAGE_CONFIG`, falling back to the default path
    pub fn from_env() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        tracing::info!(path = %path, "Loading triage configuration");
        Self::from_file(&path)
    }

    fn validate(&self) -> Result<()> {
        if self.taxonomy.timeout_secs == 0 {
            return Err(TriageError::Config(
                "taxonomy.timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.taxonomy.tags_url()?;
        self.taxonomy.buildings_url()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
taxonomy:
  base_url: "https://facilities.example.com/api"
  tags_path: "/incidence_tags"
  timeout_secs: 10
"#;

    #[test]
    fn test_defaults_and_url_joining() {
        let config = TriageConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.taxonomy.timeout_secs, 10);
        assert_eq!(config.logging.filter, "incident_triage=info");
        assert_eq!(
            config.taxonomy.tags_url().unwrap().as_str(),
            "https://facilities.example.com/api/incidence_tags"
        );
        assert_eq!(
            config.taxonomy.buildings_url().unwrap().as_str(),
            "https://facilities.example.com/api/buildings"
        );
    }

    #[test]
    fn test_rejects_zero_timeout_and_bad_url() {
        let zero = SAMPLE.replace("timeout_secs: 10", "timeout_secs: 0");
        assert!(matches!(
            TriageConfig::from_yaml(&zero),
            Err(TriageError::Config(_))
        ));

        let bad = "taxonomy:\n  base_url: \"not a url\"\n";
        assert!(matches!(
            TriageConfig::from_yaml(bad),
            Err(TriageError::Url { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = TriageConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.taxonomy.tags_path, "/incidence_tags");

        assert!(matches!(
            TriageConfig::from_file("/nonexistent/incident_triage.yaml"),
            Err(TriageError::Io { .. })
        ));
    }
}
