// Retrieval-augmented answering
// Stores chunk embeddings in the vector index and answers questions from the best matches


use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

use crate::config::RetrievalConfig;
use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::vector::{
    IndexSpec, QueryMatch, RecordMetadata, StoredRecord, VectorDatabase, VectorIndex,
};
use crate::{HrError, Result};

/// Returned when no stored chunk scores above the threshold
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the HR documents for your question.";

/// Returned in place of the generated text when the generator fails
pub const GENERATION_FALLBACK_ANSWER: &str =
    "There was an issue formatting the response with Gemini.";

/// Outcome of answering one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// Deduplicated file names of every match above the threshold
    pub sources: BTreeSet<String>,
    /// Set when the fallback text replaced a failed generation
    pub generation_error: Option<String>,
}

impl Answer {
    #[inline]
    pub fn no_context() -> Self {
        Self {
            text: NO_CONTEXT_ANSWER.to_string(),
            sources: BTreeSet::new(),
            generation_error: None,
        }
    }

    #[inline]
    pub fn found_context(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Create the index described by `spec` unless it already exists
///
/// Returns `true` when a new index was created.
#[inline]
pub fn ensure_index(database: &dyn VectorDatabase, spec: &IndexSpec) -> Result<bool> {
    let existing = database
        .list_indexes()
        .map_err(|e| HrError::VectorStore(format!("Failed to list indexes: {:#}", e)))?;

    if existing.iter().any(|name| name == &spec.name) {
        debug!("Reusing existing index {}", spec.name);
        return Ok(false);
    }

    info!(
        "Creating index {} ({} dimensions, {} metric, {}/{})",
        spec.name, spec.dimension, spec.metric, spec.cloud, spec.region
    );
    database.create_index(spec).map_err(|e| {
        HrError::VectorStore(format!("Failed to create index {}: {:#}", spec.name, e))
    })?;
    Ok(true)
}

/// The fixed assistant prompt wrapped around retrieved context and the raw query
#[inline]
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "You are an AI HR Assistant. Use the following context from internal HR documents to answer the user's query clearly, concisely, and professionally.\n\nContext:\n{}\n\nUser Query:\n{}\n\nAnswer:",
        context, query
    )
}

pub struct RagCoordinator {
    embedder: Box<dyn Embedder>,
    index: Box<dyn VectorIndex>,
    generator: Box<dyn Generator>,
    retrieval: RetrievalConfig,
}

impl RagCoordinator {
    #[inline]
    pub fn new(
        embedder: Box<dyn Embedder>,
        index: Box<dyn VectorIndex>,
        generator: Box<dyn Generator>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            retrieval,
        }
    }

    /// Make sure the index exists, then open it
    ///
    /// Safe to call repeatedly: an existing index is reused, never recreated.
    #[inline]
    pub fn initialize(
        embedder: Box<dyn Embedder>,
        database: &dyn VectorDatabase,
        generator: Box<dyn Generator>,
        spec: &IndexSpec,
        retrieval: RetrievalConfig,
    ) -> Result<Self> {
        if embedder.dimension() != spec.dimension {
            return Err(HrError::Config(format!(
                "Embedding dimension {} does not match index dimension {}",
                embedder.dimension(),
                spec.dimension
            )));
        }

        ensure_index(database, spec)?;
        let index = database.open_index(&spec.name).map_err(|e| {
            HrError::VectorStore(format!("Failed to open index {}: {:#}", spec.name, e))
        })?;

        Ok(Self::new(embedder, index, generator, retrieval))
    }

    /// Embed `chunks` and upsert them as `{source}_{i}` records
    ///
    /// Nothing is written when embedding fails.
    #[inline]
    pub fn store(&self, chunks: &[String], source: &str) -> Result<usize> {
        if chunks.is_empty() {
            debug!("No chunks to store for {}", source);
            return Ok(0);
        }

        let embeddings = self.embedder.embed(chunks).map_err(|e| {
            error!("Embedding failed for {}: {:#}", source, e);
            HrError::Embedding(format!("{:#}", e))
        })?;

        if embeddings.len() != chunks.len() {
            return Err(HrError::Embedding(format!(
                "Expected {} embeddings for {}, got {}",
                chunks.len(),
                source,
                embeddings.len()
            )));
        }

        let records: Vec<StoredRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, values))| StoredRecord::new(source, i, text.clone(), values))
            .collect();

        let written = self.index.upsert(&records).map_err(|e| {
            error!("Upsert failed for {}: {:#}", source, e);
            HrError::VectorStore(format!("{:#}", e))
        })?;

        info!("Stored {} chunks from {}", written, source);
        Ok(written)
    }

    /// Answer `query` from the stored chunks
    ///
    /// A failed generation still yields an [`Answer`] carrying the fallback text.
    #[inline]
    pub fn answer(&self, query: &str) -> Result<Answer> {
        if query.trim().is_empty() {
            return Err(HrError::EmptyQuery);
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .map_err(|e| HrError::Embedding(format!("{:#}", e)))?
            .into_iter()
            .next()
            .ok_or_else(|| HrError::Embedding("No embedding returned for query".to_string()))?;

        let matches = self
            .index
            .query(&query_vector, self.retrieval.top_k)
            .map_err(|e| HrError::VectorStore(format!("Similarity query failed: {:#}", e)))?;
        debug!("Similarity query returned {} matches", matches.len());

        let relevant = self.relevant_matches(matches);
        if relevant.is_empty() {
            info!("No match above {} for query", self.retrieval.score_threshold);
            return Ok(Answer::no_context());
        }

        let context = relevant
            .iter()
            .take(self.retrieval.context_chunks)
            .map(|metadata| metadata.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let sources: BTreeSet<String> = relevant
            .iter()
            .map(|metadata| metadata.source.clone())
            .collect();

        let prompt = build_prompt(&context, query);
        match self.generator.generate(&prompt) {
            Ok(text) => Ok(Answer {
                text,
                sources,
                generation_error: None,
            }),
            Err(e) => {
                warn!("Generation failed, using fallback answer: {:#}", e);
                Ok(Answer {
                    text: GENERATION_FALLBACK_ANSWER.to_string(),
                    sources,
                    generation_error: Some(format!("{:#}", e)),
                })
            }
        }
    }

    #[inline]
    pub fn record_count(&self) -> Result<u64> {
        self.index
            .record_count()
            .map_err(|e| HrError::VectorStore(format!("{:#}", e)))
    }

    // Matches strictly above the threshold, in provider rank order
    fn relevant_matches(&self, matches: Vec<QueryMatch>) -> Vec<RecordMetadata> {
        matches
            .into_iter()
            .filter(|m| m.score > self.retrieval.score_threshold)
            .filter_map(|m| {
                if m.metadata.is_none() {
                    warn!("Match {} has no metadata, ignoring it", m.id);
                }
                m.metadata
            })
            .collect()
    }
}
