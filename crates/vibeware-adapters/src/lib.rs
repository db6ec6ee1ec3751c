//! # vibeware-adapters
//!
//! Concrete implementations of the seams `vibeware-core` defines:
//! - [`HttpCompletionClient`] for OpenAI-compatible, Anthropic and Gemini models
//! - [`CommandValidator`] for the project's external checker
//! - [`ConsoleProgress`] for terminal output

pub mod console;
pub mod http_client;
pub mod provider;
pub mod response;
pub mod validator;

pub use console::{ConsoleProgress, credential_env_var};
pub use http_client::HttpCompletionClient;
pub use provider::{ApiKeys, Provider};
pub use response::{extract_body_text, extract_text};
pub use validator::CommandValidator;
