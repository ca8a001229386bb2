// Generation module
// Single-turn prompt completion against a hosted generative model

pub mod gemini;

pub use gemini::GeminiClient;

/// Turns one prompt into one completion
pub trait Generator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
