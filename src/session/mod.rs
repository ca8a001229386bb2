// Interactive session context
// Owns the processor, the coordinator and the query history for one session


use anyhow::Context;
use tracing::{info, warn};

use crate::config::{Config, Secrets};
use crate::documents::{DocumentProcessor, UploadedFile};
use crate::embeddings::OllamaClient;
use crate::generation::GeminiClient;
use crate::rag::{Answer, RagCoordinator};
use crate::vector::{IndexSpec, PineconeClient};
use crate::{HrError, Result};

/// Number of history entries shown, most recent first
pub const RECENT_HISTORY_LEN: usize = 5;

pub const SAMPLE_QUESTIONS: [&str; 4] = [
    "How many vacation days do new employees get?",
    "What's the remote work policy?",
    "How do I apply for parental leave?",
    "What are the health insurance options?",
];

/// What happened to one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Chunks written to the index
    Stored(usize),
    /// Nothing to store: unsupported type or no extractable text
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub files: Vec<FileReport>,
    pub total_chunks: usize,
}

impl UploadReport {
    #[inline]
    pub fn stored_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Stored(n) if n > 0))
            .count()
    }
}

pub struct Session {
    processor: DocumentProcessor,
    coordinator: RagCoordinator,
    history: Vec<String>,
}

impl Session {
    #[inline]
    pub fn new(processor: DocumentProcessor, coordinator: RagCoordinator) -> Self {
        Self {
            processor,
            coordinator,
            history: Vec::new(),
        }
    }

    /// Connect to the configured services and make sure the index exists
    #[inline]
    pub fn connect(config: &Config, secrets: &Secrets) -> Result<Self> {
        let embedder =
            OllamaClient::new(&config.embedding).context("Failed to create embedding client")?;
        let database = PineconeClient::new(&config.pinecone, &secrets.pinecone_api_key)
            .context("Failed to create vector database client")?;
        let generator = GeminiClient::new(&config.gemini, &secrets.gemini_api_key)
            .context("Failed to create generation client")?;

        let spec = index_spec(config);
        let coordinator = RagCoordinator::initialize(
            Box::new(embedder),
            &database,
            Box::new(generator),
            &spec,
            config.retrieval.clone(),
        )?;
        info!("Session connected to index {}", spec.name);

        Ok(Self::new(
            DocumentProcessor::new(config.chunking.clone()),
            coordinator,
        ))
    }

    #[inline]
    pub fn coordinator(&self) -> &RagCoordinator {
        &self.coordinator
    }

    /// Process then store one file
    #[inline]
    pub fn upload_file(&self, file: &UploadedFile) -> FileOutcome {
        let chunks = match self.processor.process(file) {
            Ok(chunks) => chunks,
            Err(e @ HrError::UnsupportedFileType(_)) => return FileOutcome::Skipped(e.to_string()),
            Err(e) => {
                warn!("Processing {} failed: {}", file.name, e);
                return FileOutcome::Failed(e.to_string());
            }
        };

        if chunks.is_empty() {
            return FileOutcome::Skipped("No text could be extracted".to_string());
        }

        match self.coordinator.store(&chunks, &file.name) {
            Ok(count) => FileOutcome::Stored(count),
            Err(e) => FileOutcome::Failed(e.to_string()),
        }
    }

    /// Upload files strictly one after another, calling `progress` after each
    #[inline]
    pub fn upload_with<F>(&self, files: &[UploadedFile], mut progress: F) -> UploadReport
    where
        F: FnMut(&FileReport, usize),
    {
        let mut report = UploadReport::default();
        for file in files {
            let outcome = self.upload_file(file);
            if let FileOutcome::Stored(count) = outcome {
                report.total_chunks += count;
            }
            let file_report = FileReport {
                name: file.name.clone(),
                outcome,
            };
            progress(&file_report, report.total_chunks);
            report.files.push(file_report);
        }

        info!(
            "Upload finished: {} chunks from {} of {} files",
            report.total_chunks,
            report.stored_files(),
            files.len()
        );
        report
    }

    #[inline]
    pub fn upload(&self, files: &[UploadedFile]) -> UploadReport {
        self.upload_with(files, |_, _| {})
    }

    /// Answer a question, recording it in the history even when answering fails
    #[inline]
    pub fn ask(&mut self, query: &str) -> Result<Answer> {
        if query.trim().is_empty() {
            return Err(HrError::EmptyQuery);
        }

        let result = self.coordinator.answer(query);
        self.history.push(query.to_string());
        result
    }

    #[inline]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Up to `limit` past queries, most recent first
    #[inline]
    pub fn recent_history(&self, limit: usize) -> Vec<&str> {
        self.history
            .iter()
            .rev()
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

/// Index settings derived from the configuration
#[inline]
pub fn index_spec(config: &Config) -> IndexSpec {
    IndexSpec {
        name: config.pinecone.index_name.clone(),
        dimension: config.embedding.dimension as usize,
        metric: config.pinecone.metric.clone(),
        cloud: config.pinecone.cloud.clone(),
        region: config.pinecone.region.clone(),
    }
}
