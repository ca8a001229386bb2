
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::ConfigError;

pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// API credentials supplied once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub pinecone_api_key: String,
    pub gemini_api_key: String,
}

/// Optional on-disk fallback, `secrets.toml` in the configuration directory
#[derive(Debug, Default, Deserialize)]
pub struct SecretsFile {
    #[serde(rename = "PINECONE_API_KEY")]
    pub pinecone_api_key: Option<String>,
    #[serde(rename = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,
}

impl Secrets {
    /// Resolve secrets from the process environment, falling back to `secrets.toml`
    #[inline]
    pub fn load(secrets_path: &Path) -> Result<Self, ConfigError> {
        let file = SecretsFile::read(secrets_path)?;
        Self::resolve(|name| std::env::var(name).ok(), &file)
    }

    /// Resolve secrets from an arbitrary lookup, taking precedence over the file
    #[inline]
    pub fn resolve<F>(lookup: F, file: &SecretsFile) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &'static str, fallback: Option<&String>| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| fallback.filter(|value| !value.trim().is_empty()).cloned())
                .ok_or(ConfigError::MissingSecret(name))
        };

        Ok(Self {
            pinecone_api_key: pick(PINECONE_API_KEY, file.pinecone_api_key.as_ref())?,
            gemini_api_key: pick(GEMINI_API_KEY, file.gemini_api_key.as_ref())?,
        })
    }
}

impl SecretsFile {
    #[inline]
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No secrets file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("pinecone_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}
