// Configuration management module
// TOML settings for the external services plus the startup secrets

pub mod interactive;
pub mod secrets;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use secrets::{Secrets, SecretsFile};
pub use settings::{
    Config, ConfigError, EmbeddingConfig, GeminiConfig, PineconeConfig, RetrievalConfig,
};
