use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::traits::{BackendSession, ChatBackend};
use super::types::{ModelConfig, ModelResponse, TokenUsage};
use crate::constants::{
    BLOCKING_FINISH_REASONS, DEFAULT_GEMINI_API_BASE, HEALTH_CHECK_TIMEOUT_SECS,
    HTTP_CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS,
};
use crate::utils::BackendError;

/// Backend for the Gemini Generative Language API
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model_name: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(api_key: impl Into<String>, model_name: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, model_name, DEFAULT_GEMINI_API_BASE, REQUEST_TIMEOUT_SECS)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
                .timeout(Duration::from_secs(timeout_secs))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_name: model_name.into(),
        })
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    fn start_session(&self, config: &ModelConfig) -> Result<Box<dyn BackendSession>, BackendError> {
        if self.api_key.trim().is_empty() {
            return Err(BackendError::Configuration(
                "Gemini API key is not configured".to_string(),
            ));
        }

        Ok(Box::new(GeminiSession {
            client: self.client.clone(),
            url: format!("{}/{}:generateContent", self.base_url, config.model),
            api_key: self.api_key.clone(),
            generation_config: generation_config(config),
            contents: Vec::new(),
        }))
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    async fn validate_connection(&self) -> Result<bool> {
        let url = format!("{}/{}", self.base_url, self.model_name);

        let health_client = Client::builder()
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .build()?;

        match health_client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// One remote conversation. Gemini is stateless over HTTP, so the handle
/// carries the accumulated turns and replays them on every request.
struct GeminiSession {
    client: Client,
    url: String,
    api_key: String,
    generation_config: Value,
    contents: Vec<Value>,
}

#[async_trait]
impl BackendSession for GeminiSession {
    async fn send_message(&mut self, text: &str) -> Result<Option<ModelResponse>, BackendError> {
        let user_turn = content_turn("user", text);
        let body = self.request_body(&user_turn);

        debug!(url = %self.url, turns = self.contents.len() + 1, "Gemini API request");

        // Turns are committed only once a usable reply arrives, so a failed
        // or dropped request leaves the handle untouched
        let outcome = self.post(&body).await;
        if let Ok(Some(ModelResponse { text: Some(reply), .. })) = &outcome {
            if !reply.trim().is_empty() {
                self.contents.push(user_turn);
                self.contents.push(content_turn("model", reply));
            }
        }
        outcome
    }
}

impl GeminiSession {
    fn request_body(&self, user_turn: &Value) -> Value {
        let mut contents = self.contents.clone();
        contents.push(user_turn.clone());
        json!({
            "contents": contents,
            "generationConfig": self.generation_config,
        })
    }

    async fn post(&self, body: &Value) -> Result<Option<ModelResponse>, BackendError> {
        let response = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(BackendError::Unavailable {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        parse_response(&json)
    }
}

fn generation_config(config: &ModelConfig) -> Value {
    json!({
        "maxOutputTokens": config.max_output_tokens,
        "temperature": config.temperature,
        "topP": config.top_p,
        "topK": config.top_k,
    })
}

fn content_turn(role: &str, text: &str) -> Value {
    json!({
        "role": role,
        "parts": [{ "text": text }]
    })
}

/// Map a generateContent payload onto the backend boundary
fn parse_response(json: &Value) -> Result<Option<ModelResponse>, BackendError> {
    if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
        return Err(BackendError::Blocked {
            reason: reason.to_string(),
        });
    }

    let first = match json["candidates"].as_array().and_then(|c| c.first()) {
        Some(candidate) => candidate,
        None => return Ok(None),
    };

    if let Some(reason) = first["finishReason"].as_str() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(BackendError::Blocked {
                reason: reason.to_string(),
            });
        }
    }

    let text = first["content"]["parts"].as_array().and_then(|parts| {
        let texts: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    });

    let usage = json.get("usageMetadata").map(|meta| {
        let prompt_tokens = meta["promptTokenCount"].as_u64().unwrap_or(0);
        let completion_tokens = meta["candidatesTokenCount"].as_u64().unwrap_or(0);
        TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: meta["totalTokenCount"]
                .as_u64()
                .unwrap_or(prompt_tokens + completion_tokens),
        }
    });

    Ok(Some(ModelResponse { text, usage }))
}
