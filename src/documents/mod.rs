// Document processing module
// Uploaded PDF/DOCX files to overlapping text chunks


pub mod docx;

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::splitter::{ChunkingConfig, split_pages};
use crate::{HrError, Result};

/// A file handed over by the front end: its name and raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Supported document formats, chosen by case-sensitive file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    #[inline]
    pub fn from_file_name(name: &str) -> Option<Self> {
        match Path::new(name).extension().and_then(OsStr::to_str) {
            Some("pdf") => Some(Self::Pdf),
            Some("docx") => Some(Self::Docx),
            _ => None,
        }
    }

    #[inline]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl UploadedFile {
    #[inline]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it after its final path component
    #[inline]
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| HrError::Config(format!("Invalid file path: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }
}

/// Turns uploaded files into chunk texts ready for embedding
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    chunking: ChunkingConfig,
    /// Where uploads are staged; the system temp directory when unset
    staging_dir: Option<PathBuf>,
}

impl DocumentProcessor {
    #[inline]
    pub fn new(chunking: ChunkingConfig) -> Self {
        Self {
            chunking,
            staging_dir: None,
        }
    }

    #[inline]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    #[inline]
    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Extract the text of `file` and split it into overlapping chunks
    ///
    /// The content is staged in a temporary file that is removed on every exit path.
    #[inline]
    pub fn process(&self, file: &UploadedFile) -> Result<Vec<String>> {
        let Some(kind) = DocumentKind::from_file_name(&file.name) else {
            warn!("Rejecting unsupported file {}", file.name);
            return Err(HrError::UnsupportedFileType(file.name.clone()));
        };

        let suffix = format!(".{}", kind.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("hr-upload-").suffix(&suffix);
        let mut staged = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        staged.write_all(&file.bytes)?;
        staged.flush()?;
        debug!(
            "Staged {} ({} bytes) at {}",
            file.name,
            file.bytes.len(),
            staged.path().display()
        );

        let pages = extract_pages(kind, staged.path()).map_err(|message| HrError::Extraction {
            file: file.name.clone(),
            message,
        })?;

        let chunks = split_pages(&pages, &self.chunking);
        info!(
            "Processed {} into {} chunks from {} page(s)",
            file.name,
            chunks.len(),
            pages.len()
        );

        Ok(chunks)
    }
}

fn extract_pages(kind: DocumentKind, path: &Path) -> std::result::Result<Vec<String>, String> {
    match kind {
        DocumentKind::Pdf => {
            // The PDF parser panics on some malformed inputs
            let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path))
                .map_err(|_| "PDF parser aborted on malformed input".to_string())?
                .map_err(|e| e.to_string())?;
            debug!("Extracted {} page(s) from {}", pages.len(), path.display());
            Ok(pages)
        }
        DocumentKind::Docx => {
            let text = docx::extract_text(path).map_err(|e| format!("{:#}", e))?;
            Ok(vec![text])
        }
    }
}
