
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{IndexSpec, QueryMatch, StoredRecord, VectorDatabase, VectorIndex};
use crate::config::PineconeConfig;
use crate::http;

/// Authenticated blocking connection shared by control- and data-plane clients
#[derive(Clone)]
struct Connection {
    agent: ureq::Agent,
    api_key: String,
    api_version: String,
}

/// Control-plane client: lists, creates and describes indexes
#[derive(Clone)]
pub struct PineconeClient {
    api_url: Url,
    connection: Connection,
}

/// Data-plane client for a single index host
#[derive(Clone)]
pub struct PineconeIndex {
    name: String,
    host: Url,
    connection: Connection,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: Option<usize>,
    pub metric: Option<String>,
    #[serde(default)]
    pub host: String,
    pub status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexPlacement<'a>,
}

#[derive(Debug, Serialize)]
struct IndexPlacement<'a> {
    serverless: ServerlessPlacement<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessPlacement<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [StoredRecord],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: u64,
}

impl Connection {
    fn get(&self, url: &Url) -> Result<String> {
        http::execute(url.as_str(), || {
            self.agent
                .get(url.as_str())
                .header("Api-Key", self.api_key.as_str())
                .header("X-Pinecone-API-Version", self.api_version.as_str())
                .header("Accept", "application/json")
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn post(&self, url: &Url, body: &str) -> Result<String> {
        http::execute(url.as_str(), || {
            self.agent
                .post(url.as_str())
                .header("Api-Key", self.api_key.as_str())
                .header("X-Pinecone-API-Version", self.api_version.as_str())
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .send(body)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }
}

impl PineconeClient {
    #[inline]
    pub fn new(config: &PineconeConfig, api_key: &str) -> Result<Self> {
        let api_url = config
            .api_url()
            .context("Invalid Pinecone API URL in config")?;

        Ok(Self {
            api_url,
            connection: Connection {
                agent: http::build_agent(Duration::from_secs(config.timeout_seconds)),
                api_key: api_key.to_string(),
                api_version: config.api_version.clone(),
            },
        })
    }

    /// Full description of a named index, including its data-plane host
    #[inline]
    pub fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let url = self
            .api_url
            .join(&format!("/indexes/{}", name))
            .context("Failed to build describe URL")?;

        let response_text = self
            .connection
            .get(&url)
            .with_context(|| format!("Failed to describe index '{}'", name))?;

        serde_json::from_str(&response_text).context("Failed to parse index description")
    }

    fn index_for(&self, description: IndexDescription) -> Result<PineconeIndex> {
        if description.host.is_empty() {
            return Err(anyhow!(
                "Index '{}' has no host yet; it may still be initializing",
                description.name
            ));
        }

        Ok(PineconeIndex {
            host: host_url(&description.host)?,
            name: description.name,
            connection: self.connection.clone(),
        })
    }
}

impl VectorDatabase for PineconeClient {
    #[inline]
    fn list_indexes(&self) -> Result<Vec<String>> {
        let url = self
            .api_url
            .join("/indexes")
            .context("Failed to build list URL")?;

        let response_text = self
            .connection
            .get(&url)
            .context("Failed to list indexes")?;

        let list: IndexList =
            serde_json::from_str(&response_text).context("Failed to parse index list")?;

        debug!("Found {} indexes", list.indexes.len());
        Ok(list.indexes.into_iter().map(|index| index.name).collect())
    }

    #[inline]
    fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let url = self
            .api_url
            .join("/indexes")
            .context("Failed to build create URL")?;

        let request = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: IndexPlacement {
                serverless: ServerlessPlacement {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize create request")?;

        match self.connection.post(&url, &request_json) {
            Ok(_) => {
                info!(
                    "Created index '{}' ({} dimensions, {} metric, {}/{})",
                    spec.name, spec.dimension, spec.metric, spec.cloud, spec.region
                );
                Ok(())
            }
            // Created concurrently between listing and creating
            Err(e) if http::status_of(&e) == Some(409) => {
                info!("Index '{}' already exists", spec.name);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to create index '{}'", spec.name)),
        }
    }

    #[inline]
    fn open_index(&self, name: &str) -> Result<Box<dyn VectorIndex>> {
        let description = self.describe_index(name)?;
        let index = self.index_for(description)?;
        debug!("Opened index '{}' at {}", index.name, index.host);
        Ok(Box::new(index))
    }
}

impl VectorIndex for PineconeIndex {
    #[inline]
    fn upsert(&self, records: &[StoredRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let url = self
            .host
            .join("/vectors/upsert")
            .context("Failed to build upsert URL")?;

        let request_json = serde_json::to_string(&UpsertRequest { vectors: records })
            .context("Failed to serialize upsert request")?;

        let response_text = self
            .connection
            .post(&url, &request_json)
            .with_context(|| format!("Failed to upsert {} records", records.len()))?;

        let response: UpsertResponse =
            serde_json::from_str(&response_text).context("Failed to parse upsert response")?;

        info!(
            "Upserted {} records into '{}'",
            response.upserted_count, self.name
        );
        Ok(response.upserted_count)
    }

    #[inline]
    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let url = self
            .host
            .join("/query")
            .context("Failed to build query URL")?;

        let request_json = serde_json::to_string(&QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        })
        .context("Failed to serialize query request")?;

        let response_text = self
            .connection
            .post(&url, &request_json)
            .context("Failed to query index")?;

        let response: QueryResponse =
            serde_json::from_str(&response_text).context("Failed to parse query response")?;

        debug!(
            "Query returned {} matches from '{}'",
            response.matches.len(),
            self.name
        );
        Ok(response.matches)
    }

    #[inline]
    fn record_count(&self) -> Result<u64> {
        let url = self
            .host
            .join("/describe_index_stats")
            .context("Failed to build stats URL")?;

        let response_text = self
            .connection
            .post(&url, "{}")
            .context("Failed to fetch index statistics")?;

        let stats: IndexStats =
            serde_json::from_str(&response_text).context("Failed to parse index statistics")?;

        Ok(stats.total_vector_count)
    }
}

/// Index hosts are reported without a scheme
fn host_url(host: &str) -> Result<Url> {
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    Url::parse(&candidate).with_context(|| format!("Invalid index host: {}", host))
}

impl fmt::Debug for PineconeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeClient")
            .field("api_url", &self.api_url.as_str())
            .field("api_version", &self.connection.api_version)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("name", &self.name)
            .field("host", &self.host.as_str())
            .finish_non_exhaustive()
    }
}
