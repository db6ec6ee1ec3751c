//! Provider routing.
//!
//! A model identifier selects its backend. An explicit `openai/`, `anthropic/`
//! or `gemini/` prefix wins; otherwise `claude*` goes to Anthropic, `gemini*`
//! to Google and everything else to an OpenAI-compatible endpoint.

use std::fmt;

/// A completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];

    /// Picks the backend for `model` and returns the model name to send.
    pub fn route(model: &str) -> (Self, &str) {
        for provider in Self::ALL {
            if let Some(rest) = model.strip_prefix(provider.prefix()) {
                return (provider, rest);
            }
        }

        let lower = model.to_ascii_lowercase();
        let provider = if lower.starts_with("claude") {
            Self::Anthropic
        } else if lower.starts_with("gemini") {
            Self::Gemini
        } else {
            Self::OpenAi
        };
        (provider, model)
    }

    /// Returns the backend `model` routes to.
    pub fn for_model(model: &str) -> Self {
        Self::route(model).0
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Gemini",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::OpenAi => "openai/",
            Self::Anthropic => "anthropic/",
            Self::Gemini => "gemini/",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// API keys read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
}

impl ApiKeys {
    /// Reads all three keys, treating empty values as unset.
    pub fn from_env() -> Self {
        let read = |provider: Provider| {
            std::env::var(provider.env_var())
                .ok()
                .filter(|v| !v.trim().is_empty())
        };
        Self {
            openai: read(Provider::OpenAi),
            anthropic: read(Provider::Anthropic),
            google: read(Provider::Gemini),
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::Gemini => self.google.as_deref(),
        }
    }

    /// True when no key at all is configured.
    pub fn is_empty(&self) -> bool {
        Provider::ALL.iter().all(|&p| self.get(p).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_by_name() {
        assert_eq!(Provider::route("gpt-4o"), (Provider::OpenAi, "gpt-4o"));
        assert_eq!(
            Provider::route("claude-3-7-sonnet-latest"),
            (Provider::Anthropic, "claude-3-7-sonnet-latest")
        );
        assert_eq!(
            Provider::route("gemini-2.5-pro-exp-03-25"),
            (Provider::Gemini, "gemini-2.5-pro-exp-03-25")
        );
        assert_eq!(Provider::for_model("llama3"), Provider::OpenAi);
    }

    #[test]
    fn test_explicit_prefix_wins() {
        assert_eq!(Provider::route("openai/claude-clone"), (Provider::OpenAi, "claude-clone"));
        assert_eq!(Provider::route("anthropic/my-model"), (Provider::Anthropic, "my-model"));
        assert_eq!(
            Provider::route("gemini/gemini-1.5-flash"),
            (Provider::Gemini, "gemini-1.5-flash")
        );
    }

    #[test]
    fn test_keys_lookup() {
        let keys = ApiKeys {
            anthropic: Some("sk-ant".to_string()),
            ..ApiKeys::default()
        };
        assert_eq!(keys.get(Provider::Anthropic), Some("sk-ant"));
        assert_eq!(keys.get(Provider::OpenAi), None);
        assert!(!keys.is_empty());
        assert!(ApiKeys::default().is_empty());
    }
}
