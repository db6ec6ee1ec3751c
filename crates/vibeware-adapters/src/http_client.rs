//! HTTP completion client.
//!
//! One client serves all three backends; the model identifier picks which one
//! a request goes to (see [`Provider::route`]).

use crate::provider::{ApiKeys, Provider};
use crate::response::extract_body_text;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};
use vibeware_core::{CompletionClient, CompletionError, ProvidersConfig};
use vibeware_proto::{ChatMessage, Role};

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion client speaking the OpenAI, Anthropic and Gemini HTTP APIs.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    keys: ApiKeys,
    config: ProvidersConfig,
}

impl HttpCompletionClient {
    pub fn new(keys: ApiKeys, config: ProvidersConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            keys,
            config,
        }
    }

    /// Builds a client with keys taken from the environment.
    pub fn from_env(config: ProvidersConfig) -> Self {
        Self::new(ApiKeys::from_env(), config)
    }

    fn base_url(&self, provider: Provider) -> &str {
        let configured = match provider {
            Provider::OpenAi => self.config.openai_base_url.as_deref(),
            Provider::Anthropic => self.config.anthropic_base_url.as_deref(),
            Provider::Gemini => self.config.gemini_base_url.as_deref(),
        };
        configured
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Resolves the key for `provider`.
    ///
    /// A custom OpenAI-compatible endpoint may be keyless; every other case
    /// requires the key.
    fn api_key(&self, provider: Provider) -> Result<Option<&str>, CompletionError> {
        match self.keys.get(provider) {
            Some(key) => Ok(Some(key)),
            None if provider == Provider::OpenAi && self.config.openai_base_url.is_some() => {
                Ok(None)
            }
            None => Err(CompletionError::MissingApiKey {
                provider: provider.name(),
                env_var: provider.env_var(),
            }),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, CompletionError> {
        let (provider, model) = Provider::route(model);
        let key = self.api_key(provider)?;
        let url = endpoint(self.base_url(provider), provider, model);
        let body = request_body(provider, model, messages, self.config.max_tokens);

        debug!(
            %provider,
            model,
            url = %url,
            messages = messages.len(),
            "Sending completion request"
        );

        let mut request = self.http.post(&url).json(&body);
        request = match (provider, key) {
            (Provider::OpenAi, Some(key)) => request.bearer_auth(key),
            (Provider::Anthropic, Some(key)) => request
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            (Provider::Gemini, Some(key)) => request.header("x-goog-api-key", key),
            (_, None) => request,
        };

        let transport = move |e: reqwest::Error| CompletionError::Transport {
            provider: provider.name(),
            message: e.to_string(),
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport)?;

        if !(200..300).contains(&status) {
            warn!(%provider, status, "Completion request failed");
            return Err(http_error(provider, status, text));
        }

        extract_body_text(&text).ok_or(CompletionError::EmptyResponse)
    }
}

/// Maps a non-success status to an error. 401 and 403 are credential problems.
fn http_error(provider: Provider, status: u16, body: String) -> CompletionError {
    match status {
        401 | 403 => CompletionError::AuthenticationFailed {
            provider: provider.name(),
            status,
            body,
        },
        _ => CompletionError::Http {
            provider: provider.name(),
            status,
            body,
        },
    }
}

/// Returns the request URL for `model` on `provider`.
pub fn endpoint(base_url: &str, provider: Provider, model: &str) -> String {
    match provider {
        Provider::OpenAi => format!("{base_url}/chat/completions"),
        Provider::Anthropic => format!("{base_url}/messages"),
        Provider::Gemini => format!("{base_url}/models/{model}:generateContent"),
    }
}

/// Builds the JSON request body for `provider`.
pub fn request_body(
    provider: Provider,
    model: &str,
    messages: &[ChatMessage],
    max_tokens: u32,
) -> Value {
    match provider {
        Provider::OpenAi => json!({
            "model": model,
            "messages": messages
                .iter()
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect::<Vec<_>>(),
        }),
        Provider::Anthropic => {
            let mut body = json!({
                "model": model,
                "max_tokens": max_tokens,
                "messages": messages
                    .iter()
                    .filter(|m| m.role != Role::System)
                    .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                    .collect::<Vec<_>>(),
            });
            if let Some(system) = system_text(messages) {
                body["system"] = json!(system);
            }
            body
        }
        Provider::Gemini => {
            let mut body = json!({
                "contents": messages
                    .iter()
                    .filter(|m| m.role != Role::System)
                    .map(|m| {
                        let role = if m.role == Role::Assistant { "model" } else { "user" };
                        json!({ "role": role, "parts": [{ "text": m.content }] })
                    })
                    .collect::<Vec<_>>(),
                "generationConfig": { "maxOutputTokens": max_tokens },
            });
            if let Some(system) = system_text(messages) {
                body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
            }
            body
        }
    }
}

/// Joins all system messages; Anthropic and Gemini take them out of band.
fn system_text(messages: &[ChatMessage]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<ChatMessage> {
        vec![ChatMessage::system("be terse"), ChatMessage::user("make a game")]
    }

    #[test]
    fn test_openai_body_keeps_system_inline() {
        let body = request_body(Provider::OpenAi, "gpt-4o", &conversation(), 8192);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "make a game");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_anthropic_body_lifts_system() {
        let body = request_body(
            Provider::Anthropic,
            "claude-3-7-sonnet-latest",
            &conversation(),
            4096,
        );
        assert_eq!(body["system"], "be terse");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_gemini_body() {
        let mut messages = conversation();
        messages.push(ChatMessage::assistant("ok"));
        let body = request_body(Provider::Gemini, "gemini-2.5-pro-exp-03-25", &messages, 8192);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            endpoint("https://api.openai.com/v1", Provider::OpenAi, "gpt-4o"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("https://x/v1beta", Provider::Gemini, "gemini-pro"),
            "https://x/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_auth_statuses_are_credential_errors() {
        assert!(http_error(Provider::OpenAi, 401, String::new()).is_credential_error());
        assert!(http_error(Provider::Gemini, 403, String::new()).is_credential_error());
        assert!(!http_error(Provider::OpenAi, 500, "overloaded".to_string()).is_credential_error());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        let client = HttpCompletionClient::new(ApiKeys::default(), ProvidersConfig::default());
        let err = client
            .complete("claude-3-7-sonnet-latest", &conversation())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CompletionError::MissingApiKey {
                provider: "Anthropic",
                env_var: "ANTHROPIC_API_KEY",
            }
        );
    }

    #[test]
    fn test_custom_openai_endpoint_is_keyless() {
        let config = ProvidersConfig {
            openai_base_url: Some("http://localhost:11434/v1/".to_string()),
            ..ProvidersConfig::default()
        };
        let client = HttpCompletionClient::new(ApiKeys::default(), config);
        assert_eq!(client.api_key(Provider::OpenAi), Ok(None));
        assert_eq!(client.base_url(Provider::OpenAi), "http://localhost:11434/v1");
        assert!(client.api_key(Provider::Gemini).is_err());
    }
}
