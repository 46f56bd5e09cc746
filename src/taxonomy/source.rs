//! Taxonomy sources
//!
//! The `TaxonomySource` trait lets the loader pull tags and lookups from the
//! backend over HTTP, or from fixtures and files, interchangeably.

use async_trait::async_trait;
use incident_types::{LookupOption, Tag};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::TaxonomyEndpointConfig;
use crate::error::{Result, TriageError};

/// Provider of the raw taxonomy collections
///
/// Implementations must be Send + Sync for use in async contexts.
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    /// Fetch every taxonomy tag (all kinds, both trees)
    async fn fetch_tags(&self) -> Result<Vec<Tag>>;

    /// Fetch the buildings lookup list
    async fn fetch_buildings(&self) -> Result<Vec<LookupOption>>;
}

// ============================================================================
// HTTP SOURCE
// ============================================================================

/// Taxonomy source backed by the facility backend's REST endpoints
pub struct HttpTaxonomySource {
    http: Client,
    tags_url: Url,
    buildings_url: Url,
    auth_token: Option<String>,
}

impl HttpTaxonomySource {
    pub fn new(config: &TaxonomyEndpointConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            tags_url: config.tags_url()?,
            buildings_url: config.buildings_url()?,
            auth_token: config.auth_token(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &Url, what: &str) -> Result<Vec<T>> {
        let mut request = self.http.get(url.clone()).header("Accept", "application/json");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| TriageError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Status {
                url: url.to_string(),
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TriageError::decode(what, e))?;

        decode_list(body, what)
    }
}

#[async_trait]
impl TaxonomySource for HttpTaxonomySource {
    async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        tracing::debug!(url = %self.tags_url, "Fetching taxonomy tags");
        self.get(&self.tags_url, "taxonomy tags").await
    }

    async fn fetch_buildings(&self) -> Result<Vec<LookupOption>> {
        tracing::debug!(url = %self.buildings_url, "Fetching buildings lookup");
        self.get(&self.buildings_url, "buildings").await
    }
}

// ============================================================================
// STATIC SOURCE
// ============================================================================

/// In-memory taxonomy source for fixtures and offline files
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomySource {
    tags: Vec<Tag>,
    buildings: Vec<LookupOption>,
}

#[derive(Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    tags: Vec<Value>,
    #[serde(default)]
    buildings: Vec<Value>,
}

impl StaticTaxonomySource {
    pub fn new(tags: Vec<Tag>, buildings: Vec<LookupOption>) -> Self {
        Self { tags, buildings }
    }

    /// Parse either a bare tag list or `{ "tags": [...], "buildings": [...] }`
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| TriageError::decode("taxonomy file", e))?;

        if value.is_array() {
            return Ok(Self::new(decode_list(value, "taxonomy tags")?, Vec::new()));
        }

        let file: TaxonomyFile =
            serde_json::from_value(value).map_err(|e| TriageError::decode("taxonomy file", e))?;
        Ok(Self::new(
            decode_list(Value::Array(file.tags), "taxonomy tags")?,
            decode_list(Value::Array(file.buildings), "buildings")?,
        ))
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TriageError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}

#[async_trait]
impl TaxonomySource for StaticTaxonomySource {
    async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.clone())
    }

    async fn fetch_buildings(&self) -> Result<Vec<LookupOption>> {
        Ok(self.buildings.clone())
    }
}

// ============================================================================
// DECODING
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

/// Decode a list payload, bare or wrapped as `{ "data": [...] }`.
///
/// Malformed rows are skipped with a warning; only a malformed envelope fails.
fn decode_list<T: DeserializeOwned>(body: Value, what: &str) -> Result<Vec<T>> {
    let rows = match serde_json::from_value::<Envelope>(body) {
        Ok(Envelope::List(rows)) | Ok(Envelope::Wrapped { data: rows }) => rows,
        Err(e) => return Err(TriageError::decode(what, e)),
    };

    let total = rows.len();
    let items: Vec<T> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();

    if items.len() < total {
        tracing::warn!(
            what,
            skipped = total - items.len(),
            total,
            "Skipped malformed rows"
        );
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use incident_types::{TagId, TagKind};
    use serde_json::json;

    #[test]
    fn test_decode_bare_and_wrapped_lists() {
        let bare: Vec<Tag> = decode_list(
            json!([{"id": 1, "name": "Safety", "tag_type": "IncidenceCategory", "parent_id": null}]),
            "tags",
        )
        .unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<LookupOption> =
            decode_list(json!({"data": [{"id": 4, "name": "Tower B"}]}), "buildings").unwrap();
        assert_eq!(wrapped[0].name, "Tower B");
    }

    #[test]
    fn test_decode_skips_malformed_rows() {
        let tags: Vec<Tag> = decode_list(
            json!([
                {"id": 1, "name": "Safety", "tag_type": "IncidenceCategory"},
                {"id": "not-a-number", "name": "Broken", "tag_type": "IncidenceCategory"},
                {"name": "No id", "tag_type": "IncidenceCategory"}
            ]),
            "tags",
        )
        .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, TagId(1));
    }

    #[test]
    fn test_decode_keeps_rows_with_string_ids() {
        let tags: Vec<Tag> = decode_list(
            json!({"data": [
                {"id": "1", "name": "Safety", "tag_type": "IncidenceCategory", "parent_id": null},
                {"id": 2, "name": "Slip", "tag_type": "IncidenceSubCategory", "parent_id": "1"}
            ]}),
            "tags",
        )
        .unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].parent_id, Some(TagId(1)));
    }

    #[test]
    fn test_decode_rejects_bad_envelope() {
        let result: Result<Vec<Tag>> = decode_list(json!({"rows": []}), "tags");
        assert!(matches!(result, Err(TriageError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_static_source_from_json_object() {
        let source = StaticTaxonomySource::from_json(
            r#"{
                "tags": [
                    {"id": 1, "name": "Safety", "tag_type": "IncidenceCategory", "parent_id": null},
                    {"id": 2, "name": "Slip", "tag_type": "IncidenceSubCategory", "parent_id": 1}
                ],
                "buildings": [{"id": 3, "name": "Tower A"}]
            }"#,
        )
        .unwrap();

        let tags = source.fetch_tags().await.unwrap();
        assert_eq!(tags[1].kind, TagKind::SubCategory);
        assert_eq!(source.fetch_buildings().await.unwrap().len(), 1);
    }

    #[test]
    fn test_http_source_builds_urls_from_config() {
        let config = TaxonomyEndpointConfig {
            base_url: "http://localhost:8080/api".to_string(),
            tags_path: "incidence_tags".to_string(),
            buildings_path: "buildings".to_string(),
            timeout_secs: 5,
            auth_token_env: None,
        };
        let source = HttpTaxonomySource::new(&config).unwrap();
        assert_eq!(
            source.tags_url.as_str(),
            "http://localhost:8080/api/incidence_tags"
        );
        assert!(source.auth_token.is_none());
    }
}
