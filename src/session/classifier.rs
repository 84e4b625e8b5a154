//! Maps raw backend outcomes onto [`ChatError`] kinds and their recovery.
//!
//! | Raw condition                         | Kind              | Recovery          |
//! |---------------------------------------|-------------------|-------------------|
//! | transport failure, timeout, 429/5xx   | `Transient`       | reinitialize once |
//! | no response object                    | `NoResponse`      | reinitialize once |
//! | no usable text / wrong shape          | `InvalidResponse` | reinitialize once |
//! | safety / content-policy block         | `ContentPolicy`   | fallback text     |
//! | anything else                         | `Unknown`         | reinitialize once |

use crate::constants::{CONNECTIVITY_APOLOGY, CONTENT_POLICY_APOLOGY};
use crate::models::ModelResponse;
use crate::utils::{BackendError, ChatError};

/// What the session manager does after a failed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Mark the session failed, reinitialize, resend once
    Reinitialize,
    /// Keep the session as is and answer with the fallback text
    Fallback,
}

/// Classifies backend outcomes once, at the boundary where they are observed
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Reduce a raw backend outcome to the reply text or a classified error
    pub fn classify(outcome: Result<Option<ModelResponse>, BackendError>) -> Result<String, ChatError> {
        match outcome {
            Ok(None) => Err(ChatError::NoResponse),
            Ok(Some(response)) => match response.text {
                Some(text) if !text.trim().is_empty() => Ok(text),
                Some(_) => Err(ChatError::InvalidResponse("empty response text".to_string())),
                None => Err(ChatError::InvalidResponse("response carried no text".to_string())),
            },
            Err(err) => Err(Self::classify_error(err)),
        }
    }

    pub fn classify_error(err: BackendError) -> ChatError {
        match err {
            BackendError::Transport(_) | BackendError::Timeout | BackendError::Unavailable { .. } => {
                ChatError::Transient(err.to_string())
            }
            BackendError::Blocked { reason } => ChatError::ContentPolicy(reason),
            BackendError::Malformed(detail) => ChatError::InvalidResponse(detail),
            BackendError::Api { .. } | BackendError::Configuration(_) => {
                ChatError::Unknown(err.to_string())
            }
        }
    }
}

impl ChatError {
    pub fn recovery(&self) -> Recovery {
        match self {
            ChatError::Transient(_)
            | ChatError::NoResponse
            | ChatError::InvalidResponse(_)
            | ChatError::Unknown(_)
            | ChatError::Initialization(_) => Recovery::Reinitialize,
            ChatError::ContentPolicy(_) | ChatError::EmptyMessage | ChatError::Busy => {
                Recovery::Fallback
            }
        }
    }

    /// User-safe prose shown instead of the error
    pub fn fallback_text(&self) -> &'static str {
        match self {
            ChatError::ContentPolicy(_) => CONTENT_POLICY_APOLOGY,
            _ => CONNECTIVITY_APOLOGY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_text_through() {
        let outcome = Ok(Some(ModelResponse::with_text("Hi there")));
        assert_eq!(ErrorClassifier::classify(outcome).unwrap(), "Hi there");
    }

    #[test]
    fn test_missing_or_blank_payloads() {
        assert_eq!(ErrorClassifier::classify(Ok(None)), Err(ChatError::NoResponse));

        let no_text = ErrorClassifier::classify(Ok(Some(ModelResponse::default())));
        assert!(matches!(no_text, Err(ChatError::InvalidResponse(_))));

        let blank = ErrorClassifier::classify(Ok(Some(ModelResponse::with_text("  \n"))));
        assert!(matches!(blank, Err(ChatError::InvalidResponse(_))));
    }

    #[test]
    fn test_raw_error_table() {
        let cases = vec![
            (BackendError::Transport("reset".into()), Recovery::Reinitialize),
            (BackendError::Timeout, Recovery::Reinitialize),
            (BackendError::Unavailable { status: 503 }, Recovery::Reinitialize),
            (BackendError::Malformed("eof".into()), Recovery::Reinitialize),
            (BackendError::Api { status: 400, message: "bad".into() }, Recovery::Reinitialize),
            (BackendError::Blocked { reason: "SAFETY".into() }, Recovery::Fallback),
        ];

        for (raw, expected) in cases {
            let kind = ErrorClassifier::classify_error(raw.clone());
            assert_eq!(kind.recovery(), expected, "{raw:?}");
        }
    }

    #[test]
    fn test_kinds() {
        assert!(matches!(
            ErrorClassifier::classify_error(BackendError::Timeout),
            ChatError::Transient(_)
        ));
        assert!(matches!(
            ErrorClassifier::classify_error(BackendError::Configuration("no key".into())),
            ChatError::Unknown(_)
        ));
        assert_eq!(
            ErrorClassifier::classify_error(BackendError::Blocked { reason: "SAFETY".into() }),
            ChatError::ContentPolicy("SAFETY".into())
        );
    }

    #[test]
    fn test_fallback_texts() {
        assert_eq!(ChatError::ContentPolicy("x".into()).fallback_text(), CONTENT_POLICY_APOLOGY);
        assert_eq!(ChatError::NoResponse.fallback_text(), CONNECTIVITY_APOLOGY);
        assert_eq!(ChatError::Transient("x".into()).fallback_text(), CONNECTIVITY_APOLOGY);
        assert_ne!(CONNECTIVITY_APOLOGY, CONTENT_POLICY_APOLOGY);
    }
}
