use thiserror::Error;

pub type Result<T> = std::result::Result<T, HrError>;

#[derive(Error, Debug)]
pub enum HrError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Settings(#[from] config::ConfigError),

    #[error("Unsupported file type: {0} (only .pdf and .docx are accepted)")]
    UnsupportedFileType(String),

    #[error("Text extraction failed for {file}: {message}")]
    Extraction { file: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Query is empty")]
    EmptyQuery,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod generation;
mod http;
pub mod rag;
pub mod session;
pub mod splitter;
pub mod vector;

#[cfg(test)]
mod testing;
