//! # vibeware-core
//!
//! Generation engine for VibeWare Forge.
//!
//! This crate holds everything that does not talk to the network or spawn
//! processes directly:
//! - Project context loading and prompt assembly
//! - Code extraction from model output
//! - The textual registry patcher with update and rollback
//! - Game idea generation
//! - The generate-validate-commit workflow
//!
//! Completion providers and the external checker plug in through the
//! [`CompletionClient`] and [`Validator`] traits.

pub mod completion;
pub mod config;
pub mod context;
pub mod extract;
pub mod ideas;
pub mod progress;
pub mod prompt;
pub mod registry;
pub mod validation;
pub mod workflow;

pub use completion::{CompletionClient, CompletionError};
pub use config::{
    CONFIG_FILE_NAME, ConfigError, GenerationConfig, PathsConfig, ProvidersConfig, ValidatorConfig,
    VibewareConfig,
};
pub use context::ProjectContext;
pub use extract::extract_code;
pub use ideas::{IdeaError, generate_ideas, parse_ideas};
pub use progress::{ProgressHandler, QuietProgress, truncate};
pub use prompt::{Conversation, PromptBuilder};
pub use registry::{
    GAME_MARKER, GameMetadata, METADATA_MARKER, MetadataRecord, RegistryError, RegistryPatcher,
    RollbackReport, UpdateOutcome,
};
pub use validation::{ValidationResult, Validator};
pub use workflow::{
    GenerationEvent, GenerationOutcome, GenerationReport, GenerationState, GenerationWorkflow,
};
