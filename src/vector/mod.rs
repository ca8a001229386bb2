// Vector database module
// Index management and similarity search delegated to a hosted vector database

#[cfg(test)]
mod tests;

pub mod pinecone;

use serde::{Deserialize, Deserializer, Serialize};

pub use pinecone::{PineconeClient, PineconeIndex};

/// Settings used when an index has to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

/// Unit persisted in the index, keyed by `{source}_{chunk_index}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Metadata stored next to each embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// The chunk text itself
    pub text: String,
    /// File name the chunk came from
    pub source: String,
    /// Index of the chunk within its source
    #[serde(deserialize_with = "deserialize_chunk_id")]
    pub chunk_id: usize,
}

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<RecordMetadata>,
}

impl StoredRecord {
    #[inline]
    pub fn new(source: &str, chunk_index: usize, text: String, values: Vec<f32>) -> Self {
        Self {
            id: record_id(source, chunk_index),
            values,
            metadata: RecordMetadata {
                text,
                source: source.to_string(),
                chunk_id: chunk_index,
            },
        }
    }
}

/// Deterministic record id, so re-uploading a file overwrites its earlier chunks
#[inline]
pub fn record_id(source: &str, chunk_index: usize) -> String {
    format!("{}_{}", source, chunk_index)
}

/// Control-plane operations of a hosted vector database
pub trait VectorDatabase {
    fn list_indexes(&self) -> anyhow::Result<Vec<String>>;

    fn create_index(&self, spec: &IndexSpec) -> anyhow::Result<()>;

    fn open_index(&self, name: &str) -> anyhow::Result<Box<dyn VectorIndex>>;
}

/// Data-plane operations on one named index
pub trait VectorIndex {
    /// Insert or overwrite records by id, returning how many were written
    fn upsert(&self, records: &[StoredRecord]) -> anyhow::Result<usize>;

    /// Nearest `top_k` records with their metadata, best match first
    fn query(&self, vector: &[f32], top_k: usize) -> anyhow::Result<Vec<QueryMatch>>;

    fn record_count(&self) -> anyhow::Result<u64>;
}

// Numeric metadata comes back from the service as a float
fn deserialize_chunk_id<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .or_else(|| {
            number
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        })
        .ok_or_else(|| serde::de::Error::custom(format!("invalid chunk_id: {}", number)))
}

