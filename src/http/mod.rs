// Blocking HTTP plumbing shared by the service clients

#[cfg(test)]
mod tests;

use anyhow::{Result, anyhow};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// A response with a non-success status, kept typed so callers can branch on it
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusError {
    #[error("Server error: HTTP {0}")]
    Server(u16),
    #[error("Client error: HTTP {0}")]
    Client(u16),
}

impl StatusError {
    pub(crate) fn status(self) -> u16 {
        match self {
            Self::Server(status) | Self::Client(status) => status,
        }
    }
}

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Run a request exactly once and read its body, converting failures into descriptive errors
pub(crate) fn execute<F>(target: &str, request_fn: F) -> Result<String>
where
    F: FnOnce() -> Result<String, ureq::Error>,
{
    debug!("HTTP request to {}", target);

    match request_fn() {
        Ok(response_text) => {
            debug!("Request to {} succeeded ({} bytes)", target, response_text.len());
            Ok(response_text)
        }
        Err(ureq::Error::StatusCode(status)) => {
            if status >= 500 {
                error!("Server error (status {}) from {}", status, target);
                Err(StatusError::Server(status).into())
            } else {
                warn!("Client error (status {}) from {}", status, target);
                Err(StatusError::Client(status).into())
            }
        }
        Err(
            e @ (ureq::Error::ConnectionFailed
            | ureq::Error::HostNotFound
            | ureq::Error::Timeout(_)
            | ureq::Error::Io(_)),
        ) => {
            error!("Transport error for {}: {}", target, e);
            Err(anyhow!("Transport error: {}", e))
        }
        Err(e) => {
            error!("Request to {} failed: {}", target, e);
            Err(anyhow!("Request error: {}", e))
        }
    }
}

/// Returns the HTTP status carried by an error produced by [`execute`], if any
///
/// Context added on top of the error is looked through.
pub(crate) fn status_of(error: &anyhow::Error) -> Option<u16> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StatusError>())
        .map(|status| status.status())
}
