//! Pinecone REST client.
//!
//! Talks to the control plane to resolve index hosts and to the index data
//! plane for record upserts, text search and statistics. Indexes are
//! expected to use integrated embedding, so records carry raw text and the
//! service embeds it.

use super::{RecordWriter, UpsertRequest, UpsertResponse};
use crate::config::{IndexSettings, Settings};
use crate::error::{CineloadError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Index description returned by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    /// Data-plane host, without scheme.
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Integrated embedding configuration, including the field map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

/// Per-namespace statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    #[serde(default, alias = "vectorCount")]
    pub record_count: u64,
}

/// Index statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
    #[serde(default, alias = "totalVectorCount")]
    pub total_record_count: u64,
}

/// A text search against an integrated-embedding index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub top_k: u32,
    pub inputs: SearchInputs,
    #[serde(default)]
    pub filter: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchInputs {
    pub text: String,
}

impl SearchQuery {
    pub fn new(text: &str, top_k: u32) -> Self {
        Self {
            top_k,
            inputs: SearchInputs {
                text: text.to_string(),
            },
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    fn to_body(&self) -> Value {
        let mut query = json!({
            "inputs": { "text": self.inputs.text },
            "top_k": self.top_k,
        });
        if let Some(filter) = &self.filter {
            query["filter"] = filter.clone();
        }
        json!({ "query": query })
    }
}

/// Pinecone client bound to an API key.
pub struct PineconeClient {
    http: reqwest::Client,
    control_plane: Url,
    text_field: String,
    hosts: Mutex<HashMap<String, Url>>,
}

impl PineconeClient {
    /// Create a client from settings, reading the API key from the environment.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = Settings::api_key()?;
        Self::new(&settings.index, &settings.ingest.text_field, &api_key)
    }

    /// Create a client with an explicit API key.
    pub fn new(index: &IndexSettings, text_field: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| CineloadError::Config("API key contains invalid characters".to_string()))?;
        key.set_sensitive(true);
        headers.insert("api-key", key);
        headers.insert(
            "x-pinecone-api-version",
            HeaderValue::from_str(&index.api_version).map_err(|_| {
                CineloadError::Config(format!("invalid API version '{}'", index.api_version))
            })?,
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(index.timeout_secs))
            .default_headers(headers)
            .build()?;

        let mut hosts = HashMap::new();
        if let Some(host) = &index.host {
            hosts.insert(index.name.clone(), host_url(host)?);
        }

        Ok(Self {
            http,
            control_plane: Url::parse(&index.control_plane_url)?,
            text_field: text_field.to_string(),
            hosts: Mutex::new(hosts),
        })
    }

    /// Describe an index through the control plane.
    #[instrument(skip(self))]
    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let url = join_segments(&self.control_plane, &["indexes", name])?;
        let response = check_status(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// List every index in the project.
    #[instrument(skip(self))]
    pub async fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let url = join_segments(&self.control_plane, &["indexes"])?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let list: IndexList = response.json().await?;
        Ok(list.indexes)
    }

    /// Resolve the data-plane URL of an index, caching the result.
    pub async fn index_host(&self, name: &str) -> Result<Url> {
        if let Some(url) = self.cached_host(name) {
            return Ok(url);
        }

        let description = self.describe_index(name).await?;
        let url = host_url(&description.host)?;
        debug!("Resolved host for index '{}': {}", name, url);

        self.hosts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), url.clone());
        Ok(url)
    }

    fn cached_host(&self, name: &str) -> Option<Url> {
        self.hosts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Fetch record counts per namespace.
    #[instrument(skip(self))]
    pub async fn describe_index_stats(&self, name: &str) -> Result<IndexStats> {
        let host = self.index_host(name).await?;
        let url = join_segments(&host, &["describe_index_stats"])?;
        let response = check_status(self.http.post(url).json(&json!({})).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Upsert flat records into a namespace.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn upsert_records(
        &self,
        name: &str,
        namespace: &str,
        records: &[Map<String, Value>],
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let host = self.index_host(name).await?;
        let url = records_url(&host, namespace, "upsert")?;
        let body = ndjson_body(records)?;

        check_status(
            self.http
                .post(url)
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(body)
                .send()
                .await?,
        )
        .await?;

        debug!("Upserted {} records into {}/{}", records.len(), name, namespace);
        Ok(())
    }

    /// Search a namespace by text. Returns the raw service response.
    #[instrument(skip(self, query), fields(top_k = query.top_k))]
    pub async fn search_records(
        &self,
        name: &str,
        namespace: &str,
        query: &SearchQuery,
    ) -> Result<Value> {
        let host = self.index_host(name).await?;
        let url = records_url(&host, namespace, "search")?;
        let response =
            check_status(self.http.post(url).json(&query.to_body()).send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordWriter for PineconeClient {
    async fn submit(&self, request: &UpsertRequest<'_>) -> Result<UpsertResponse> {
        let records: Vec<Map<String, Value>> = request
            .data
            .iter()
            .map(|doc| doc.to_record(&self.text_field))
            .collect();

        self.upsert_records(request.index_name, request.namespace, &records)
            .await?;

        info!(
            "Upserted batch of {} into {}/{}",
            records.len(),
            request.index_name,
            request.namespace
        );
        Ok(UpsertResponse {
            upserted_count: records.len(),
            message: "Data upserted successfully".to_string(),
        })
    }
}

/// Turn a non-2xx response into a transport error carrying the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CineloadError::Transport {
        status: status.as_u16(),
        body,
    })
}

fn host_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(Url::parse(host)?)
    } else {
        Ok(Url::parse(&format!("https://{}", host))?)
    }
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CineloadError::Config(format!("'{}' cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn records_url(host: &Url, namespace: &str, operation: &str) -> Result<Url> {
    join_segments(host, &["records", "namespaces", namespace, operation])
}

fn ndjson_body(records: &[Map<String, Value>]) -> Result<String> {
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}
