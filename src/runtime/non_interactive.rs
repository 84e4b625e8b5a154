use anyhow::Result;
use serde::Serialize;

use crate::{
    app::Config,
    cli::OutputFormat,
    models::{ChatMessage, ModelFactory},
    session::{SessionManager, SessionStatus},
};

/// Result of a non-interactive run
#[derive(Debug, Serialize)]
pub struct NonInteractiveResult {
    /// The prompt that was executed
    pub prompt: String,
    /// The assistant's reply, or the apology shown in its place
    pub response: String,
    /// Conversation log after the exchange
    pub history: Vec<ChatMessage>,
    /// Any errors that occurred
    pub errors: Vec<String>,
    /// Metadata about the execution
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExecutionMetadata {
    /// Model used
    pub model: String,
    /// Backend that served the request
    pub backend: String,
    /// Session state once the exchange finished
    pub session_status: SessionStatus,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

impl NonInteractiveResult {
    /// True when the session ended up unusable
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty() || self.metadata.session_status == SessionStatus::Failed
    }
}

/// Non-interactive runner for executing single prompts
pub struct NonInteractiveRunner {
    manager: SessionManager,
    model_name: String,
}

impl NonInteractiveRunner {
    /// Create a new non-interactive runner
    pub fn new(config: &Config) -> Result<Self> {
        let backend = ModelFactory::create(config)?;
        let manager = SessionManager::from_config(backend, config);
        Ok(Self::with_manager(manager, config.model.model.clone()))
    }

    /// Wrap an already-built session manager
    pub fn with_manager(manager: SessionManager, model_name: impl Into<String>) -> Self {
        Self {
            manager,
            model_name: model_name.into(),
        }
    }

    /// Execute a single prompt and return the result
    pub async fn execute(&self, prompt: String) -> NonInteractiveResult {
        let start_time = std::time::Instant::now();
        let mut errors = Vec::new();

        let response = match self.manager.send_message(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                errors.push(e.to_string());
                String::new()
            }
        };

        NonInteractiveResult {
            prompt,
            response,
            history: self.manager.history(),
            errors,
            metadata: ExecutionMetadata {
                model: self.model_name.clone(),
                backend: self.manager.backend_name().to_string(),
                session_status: self.manager.status().await,
                duration_ms: start_time.elapsed().as_millis(),
            },
        }
    }

    /// Format the result according to the output format
    pub fn format_result(&self, result: &NonInteractiveResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)),
            OutputFormat::Text => {
                let mut output = String::new();
                output.push_str(&result.response);

                if !result.errors.is_empty() {
                    output.push_str("\n--- Errors ---\n");
                    for error in &result.errors {
                        output.push_str(&format!("- {}\n", error));
                    }
                }

                output
            }
            OutputFormat::Markdown => {
                let mut output = String::new();

                output.push_str("## Response\n\n");
                output.push_str(&result.response);
                output.push_str("\n\n");

                if !result.errors.is_empty() {
                    output.push_str("## Errors\n\n");
                    for error in &result.errors {
                        output.push_str(&format!("- {}\n", error));
                    }
                    output.push('\n');
                }

                output.push_str("---\n");
                output.push_str(&format!(
                    "*Model: {} | Session: {} | Duration: {}ms*\n",
                    result.metadata.model, result.metadata.session_status, result.metadata.duration_ms
                ));

                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SessionConfig;
    use crate::constants::CONNECTIVITY_APOLOGY;
    use crate::models::{
        BackendSession, MessageRole, MockBackendSession, MockChatBackend, ModelConfig, ModelResponse,
    };
    use crate::session::RetryPolicy;
    use crate::utils::BackendError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn runner_with(backend: MockChatBackend) -> NonInteractiveRunner {
        let manager = SessionManager::new(Arc::new(backend), ModelConfig::default(), &SessionConfig::default())
            .with_retry_policy(RetryPolicy::new(0, Duration::ZERO));
        NonInteractiveRunner::with_manager(manager, "gemini-2.0-flash")
    }

    fn answering_backend(reply: &'static str) -> MockChatBackend {
        let mut backend = MockChatBackend::new();
        backend.expect_name().return_const("mock".to_string());
        backend.expect_start_session().returning(move |_| {
            let mut session = MockBackendSession::new();
            session
                .expect_send_message()
                .returning(move |_| Ok(Some(ModelResponse::with_text(reply))));
            Ok(Box::new(session) as Box<dyn BackendSession>)
        });
        backend
    }

    #[tokio::test]
    async fn test_execute_records_exchange() {
        let runner = runner_with(answering_backend("Our wall chargers ship in 3 days."));

        let result = runner.execute("How fast is shipping?".to_string()).await;

        assert_eq!(result.response, "Our wall chargers ship in 3 days.");
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history[0].role, MessageRole::User);
        assert_eq!(result.metadata.session_status, SessionStatus::Ready);
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_unreachable_backend_degrades() {
        let mut backend = MockChatBackend::new();
        backend.expect_name().return_const("mock".to_string());
        backend
            .expect_start_session()
            .returning(|_| Err(BackendError::Transport("connection refused".to_string())));
        let runner = runner_with(backend);

        let result = runner.execute("hello".to_string()).await;

        assert_eq!(result.response, CONNECTIVITY_APOLOGY);
        assert!(result.history.is_empty());
        assert_eq!(result.metadata.session_status, SessionStatus::Failed);
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_blank_prompt_reports_error() {
        let runner = runner_with(answering_backend("unused"));

        let result = runner.execute("   ".to_string()).await;

        assert!(result.response.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_format_result() {
        let runner = runner_with(answering_backend("Yes, we do."));
        let result = runner.execute("Do you sell adapters?".to_string()).await;

        let text = runner.format_result(&result, OutputFormat::Text);
        assert_eq!(text, "Yes, we do.");

        let markdown = runner.format_result(&result, OutputFormat::Markdown);
        assert!(markdown.starts_with("## Response\n\nYes, we do."));
        assert!(markdown.contains("*Model: gemini-2.0-flash | Session: "));

        let json: serde_json::Value =
            serde_json::from_str(&runner.format_result(&result, OutputFormat::Json)).unwrap();
        assert_eq!(json["prompt"], "Do you sell adapters?");
        assert_eq!(json["history"][1]["role"], "assistant");
        assert_eq!(json["metadata"]["model"], "gemini-2.0-flash");
    }
}
