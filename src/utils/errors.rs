use thiserror::Error;

/// Raw failure reported by a chat backend, before classification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Service unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("Blocked by safety filter: {reason}")]
    Blocked { reason: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Handshake retry budget exhausted
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to initialize chat session after {attempts} attempts: {reason}")]
pub struct InitializationError {
    pub attempts: u32,
    pub reason: String,
}

/// Error kinds surfaced by the session manager
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Another chat operation is already in progress")]
    Busy,

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error("Transient backend failure: {0}")]
    Transient(String),

    #[error("No response received from the backend")]
    NoResponse,

    #[error("Invalid response from the backend: {0}")]
    InvalidResponse(String),

    #[error("Response blocked by content policy: {0}")]
    ContentPolicy(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
