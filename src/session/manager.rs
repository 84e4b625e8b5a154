//! Session manager: the only entry point the chat UI talks to.
//!
//! One manager owns one remote conversation and its history. Operations are
//! serialized on an async mutex; `send_message` queues behind an in-flight
//! call while `try_send_message` rejects with [`ChatError::Busy`]. Apart from
//! `EmptyMessage` and `Busy`, every failure is turned into fallback prose.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::classifier::{ErrorClassifier, Recovery};
use super::conversation::ConversationHistory;
use super::retry::RetryPolicy;
use super::state::{Session, SessionStatus};
use crate::app::{Config, SessionConfig};
use crate::constants::SYSTEM_CONTEXT;
use crate::models::{BackendSession, ChatBackend, ChatMessage, ModelConfig, ModelResponse};
use crate::utils::{BackendError, ChatError, InitializationError};

pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    model_config: ModelConfig,
    system_context: String,
    retry: RetryPolicy,
    request_timeout: Duration,
    session: Mutex<Session>,
    // Kept outside the session mutex so snapshots never wait on the network
    history: RwLock<ConversationHistory>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>, model_config: ModelConfig, config: &SessionConfig) -> Self {
        Self {
            backend,
            model_config,
            system_context: config
                .system_context
                .clone()
                .unwrap_or_else(|| SYSTEM_CONTEXT.to_string()),
            retry: RetryPolicy::from_config(config),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            session: Mutex::new(Session::Uninitialized),
            history: RwLock::new(ConversationHistory::new()),
        }
    }

    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &Config) -> Self {
        Self::new(backend, config.model.clone(), &config.session)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_system_context(mut self, system_context: impl Into<String>) -> Self {
        self.system_context = system_context.into();
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Perform the handshake, retrying per the retry policy
    pub async fn initialize(&self) -> Result<(), InitializationError> {
        let mut session = self.session.lock().await;
        self.initialize_locked(&mut session).await
    }

    /// Send one user turn and return the reply or a fallback text.
    /// Only `EmptyMessage` is ever returned as an error.
    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        validate(text)?;
        let mut session = self.session.lock().await;
        Ok(self.dispatch(&mut session, text).await)
    }

    /// Like [`send_message`](Self::send_message) but rejects instead of queueing
    pub async fn try_send_message(&self, text: &str) -> Result<String, ChatError> {
        validate(text)?;
        let mut session = self.session.try_lock().map_err(|_| ChatError::Busy)?;
        Ok(self.dispatch(&mut session, text).await)
    }

    /// Forget the conversation and start a fresh handshake
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        self.history.write().clear();
        transition(&mut session, Session::reset);

        if let Err(err) = self.initialize_locked(&mut session).await {
            warn!(attempts = err.attempts, "Reset left the session without a backend; next message retries");
        }
    }

    /// Snapshot of the conversation so far
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.read().snapshot()
    }

    pub fn history_summary(&self) -> String {
        self.history.read().summary()
    }

    /// Current lifecycle state (waits for an in-flight operation)
    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status()
    }

    async fn initialize_locked(&self, session: &mut Session) -> Result<(), InitializationError> {
        transition(session, Session::begin_initializing);

        let backend = self.backend.as_ref();
        let model_config = &self.model_config;
        let system_context = self.system_context.as_str();
        let timeout = self.request_timeout;

        match self
            .retry
            .run(move || handshake(backend, model_config, system_context, timeout))
            .await
        {
            Ok(handle) => {
                transition(session, |s| s.ready(handle));
                info!(backend = backend.name(), "Chat session ready");
                Ok(())
            }
            Err(err) => {
                transition(session, Session::fail);
                error!(attempts = err.attempts, reason = %err.reason, "Chat session initialization failed");
                Err(err)
            }
        }
    }

    async fn dispatch(&self, session: &mut Session, text: &str) -> String {
        if !session.is_ready() {
            if let Err(err) = self.initialize_locked(session).await {
                return ChatError::from(err).fallback_text().to_string();
            }
        }

        self.history.write().append(ChatMessage::user(text));

        let err = match self.exchange(session, text).await {
            Ok(reply) => return self.record_reply(reply),
            Err(err) => err,
        };

        match err.recovery() {
            Recovery::Fallback => {
                // The session itself is fine; keep it
                warn!(error = %err, "Backend declined the message");
                err.fallback_text().to_string()
            }
            Recovery::Reinitialize => {
                warn!(error = %err, "Backend call failed, reinitializing session once");
                transition(session, Session::fail);

                if self.initialize_locked(session).await.is_err() {
                    return err.fallback_text().to_string();
                }

                match self.exchange(session, text).await {
                    Ok(reply) => self.record_reply(reply),
                    Err(retry_err) => {
                        if retry_err.recovery() == Recovery::Reinitialize {
                            transition(session, Session::fail);
                        }
                        warn!(error = %retry_err, "Retry after reinitialization failed");
                        retry_err.fallback_text().to_string()
                    }
                }
            }
        }
    }

    async fn exchange(&self, session: &mut Session, text: &str) -> Result<String, ChatError> {
        let handle = session
            .handle_mut()
            .ok_or_else(|| ChatError::Unknown("session is not ready".to_string()))?;

        let outcome = send_with_timeout(handle, text, self.request_timeout).await;
        if let Ok(Some(ModelResponse { usage: Some(usage), .. })) = &outcome {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }
        ErrorClassifier::classify(outcome)
    }

    fn record_reply(&self, reply: String) -> String {
        self.history.write().append(ChatMessage::assistant(reply.clone()));
        reply
    }
}

fn validate(text: &str) -> Result<(), ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    Ok(())
}

fn transition(session: &mut Session, next: impl FnOnce(Session) -> Session) {
    let current = std::mem::replace(session, Session::Uninitialized);
    let from = current.status();
    *session = next(current);
    debug!(%from, to = %session.status(), "Session transition");
}

/// Open a backend session and prime it; the acknowledgement must carry text
async fn handshake(
    backend: &dyn ChatBackend,
    model_config: &ModelConfig,
    system_context: &str,
    timeout: Duration,
) -> Result<Box<dyn BackendSession>, ChatError> {
    let mut handle = backend
        .start_session(model_config)
        .map_err(ErrorClassifier::classify_error)?;

    let ack = send_with_timeout(handle.as_mut(), system_context, timeout).await;
    ErrorClassifier::classify(ack)?;
    Ok(handle)
}

async fn send_with_timeout(
    handle: &mut dyn BackendSession,
    text: &str,
    timeout: Duration,
) -> Result<Option<ModelResponse>, BackendError> {
    match tokio::time::timeout(timeout, handle.send_message(text)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(BackendError::Timeout),
    }
}
