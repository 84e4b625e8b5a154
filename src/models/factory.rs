use anyhow::{Context, Result};
use std::sync::Arc;

use super::gemini::GeminiBackend;
use super::traits::ChatBackend;
use crate::app::Config;

/// Factory for creating backend instances from configuration
pub struct ModelFactory;

impl ModelFactory {
    /// Create the configured backend
    /// An inline `gemini.api_key` wins over the key read from `gemini.api_key_env`
    pub fn create(config: &Config) -> Result<Arc<dyn ChatBackend>> {
        let api_key = Self::resolve_api_key(config)?;

        let backend = GeminiBackend::with_base_url(
            api_key,
            config.model.model.clone(),
            config.gemini.base_url.clone(),
            config.session.request_timeout_secs,
        )?;
        Ok(Arc::new(backend))
    }

    /// Look up the API key without building a client
    pub fn resolve_api_key(config: &Config) -> Result<String> {
        if let Some(key) = config.gemini.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(&config.gemini.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| {
                format!(
                    "Gemini API key is not configured. Set {} or gemini.api_key in the config file",
                    config.gemini.api_key_env
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_key_wins() {
        let mut config = Config::default();
        config.gemini.api_key = Some("inline-key".to_string());
        config.gemini.api_key_env = "BOLT_TEST_UNSET_KEY_VAR".to_string();

        assert_eq!(ModelFactory::resolve_api_key(&config).unwrap(), "inline-key");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let mut config = Config::default();
        config.gemini.api_key = None;
        config.gemini.api_key_env = "BOLT_TEST_DEFINITELY_UNSET_VAR".to_string();

        let err = ModelFactory::resolve_api_key(&config).unwrap_err();
        assert!(err.to_string().contains("BOLT_TEST_DEFINITELY_UNSET_VAR"));
    }

    #[test]
    fn test_create_uses_configured_model() {
        let mut config = Config::default();
        config.gemini.api_key = Some("inline-key".to_string());
        config.model.model = "gemini-1.5-pro".to_string();

        let backend = ModelFactory::create(&config).unwrap();
        assert_eq!(backend.name(), "gemini-1.5-pro");
    }
}
