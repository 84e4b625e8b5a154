use anyhow::Result;
use async_trait::async_trait;

use super::types::{ModelConfig, ModelResponse};
use crate::utils::BackendError;

/// Core trait that all generative backends must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a fresh remote conversation
    fn start_session(&self, config: &ModelConfig) -> Result<Box<dyn BackendSession>, BackendError>;

    /// Get the name of the backend
    fn name(&self) -> &str;

    /// Validate that the backend is reachable
    async fn validate_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Handle to one live remote conversation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendSession: Send + Sync {
    /// Send one turn. `Ok(None)` means the backend produced no response object.
    async fn send_message(&mut self, text: &str) -> Result<Option<ModelResponse>, BackendError>;
}
