//! Completion client contract.
//!
//! Concrete HTTP providers live in `vibeware-adapters`; the workflow and the
//! idea generator only see this trait.

use async_trait::async_trait;
use vibeware_proto::ChatMessage;

/// Sends a conversation to a text-generation model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the generated text for `messages`.
    ///
    /// A response without usable text must be reported as
    /// [`CompletionError::EmptyResponse`], not as an empty string.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, CompletionError>;
}

/// Errors from a completion request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("missing api_key for {provider}: set {env_var}")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("{provider} rejected the credentials (HTTP {status}): {body}")]
    AuthenticationFailed {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("request to {provider} failed: {message}")]
    Transport { provider: &'static str, message: String },

    #[error("no content in completion response")]
    EmptyResponse,
}

impl CompletionError {
    /// Returns true if retrying cannot help because credentials are missing or
    /// rejected.
    ///
    /// Besides the explicit variants, any error whose message mentions
    /// `api_key` counts, since providers report bad keys in many shapes.
    pub fn is_credential_error(&self) -> bool {
        match self {
            CompletionError::MissingApiKey { .. }
            | CompletionError::AuthenticationFailed { .. } => true,
            other => other.to_string().to_lowercase().contains("api_key"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_classification() {
        assert!(
            CompletionError::MissingApiKey {
                provider: "openai",
                env_var: "OPENAI_API_KEY",
            }
            .is_credential_error()
        );
        assert!(
            CompletionError::AuthenticationFailed {
                provider: "openai",
                status: 401,
                body: String::new(),
            }
            .is_credential_error()
        );
        assert!(
            CompletionError::Http {
                provider: "openai",
                status: 400,
                body: r#"{"error": {"code": "invalid_API_KEY"}}"#.to_string(),
            }
            .is_credential_error()
        );
        assert!(
            CompletionError::Transport {
                provider: "custom",
                message: "Missing api_key parameter".to_string(),
            }
            .is_credential_error()
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(!CompletionError::EmptyResponse.is_credential_error());
        assert!(
            !CompletionError::Http {
                provider: "anthropic",
                status: 529,
                body: "overloaded".to_string(),
            }
            .is_credential_error()
        );
    }
}
