// Embeddings module
// Text to fixed-length vectors, computed by a co-located Ollama server

pub mod ollama;

pub use ollama::{ModelInfo, OllamaClient};

/// Produces one embedding per input text, in input order
pub trait Embedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Length of every vector returned by [`Embedder::embed`]
    fn dimension(&self) -> usize;
}
