//! Configuration for VibeWare Forge.
//!
//! Loaded from an optional `vibeware.yml` in the game project root. Every
//! section has defaults matching the stock VibeWare project layout, so the file
//! only needs the values that differ.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use vibeware_proto::GameName;

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "vibeware.yml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibewareConfig {
    pub paths: PathsConfig,
    pub generation: GenerationConfig,
    pub validator: ValidatorConfig,
    pub providers: ProvidersConfig,
}

impl VibewareConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses configuration from YAML text. An empty document yields defaults.
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}

/// Locations of the files the generator reads and writes, relative to the
/// project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Abstract scene every microgame extends.
    pub base_microgame: PathBuf,
    /// A known-good microgame shown to the model as a pattern.
    pub example_game: PathBuf,
    /// Free-form authoring instructions.
    pub instructions: PathBuf,
    /// The shared registry source file.
    pub registry: PathBuf,
    /// Directory that receives generated game sources.
    pub games_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_microgame: PathBuf::from("src/scenes/BaseMicrogame.ts"),
            example_game: PathBuf::from("src/scenes/microgames/CatchGame.ts"),
            instructions: PathBuf::from("microgame_instructions.md"),
            registry: PathBuf::from("src/scenes/microgames/registry.ts"),
            games_dir: PathBuf::from("src/scenes/microgames"),
        }
    }
}

impl PathsConfig {
    /// Returns the source file path for a generated game.
    pub fn artifact_path(&self, root: &Path, name: &GameName) -> PathBuf {
        root.join(&self.games_dir).join(format!("{name}.ts"))
    }

    /// Returns the absolute registry path.
    pub fn registry_path(&self, root: &Path) -> PathBuf {
        root.join(&self.registry)
    }
}

/// Settings for the generate-validate loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default model identifier.
    pub model: String,
    /// Attempt budget per game.
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_retries: 3,
        }
    }
}

/// External checker invocation. The game name is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub command: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            command: vec!["node".to_string(), "validateGames.cjs".to_string()],
        }
    }
}

/// Provider endpoint overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI-compatible base URL (e.g. a local server). When set, a missing
    /// `OPENAI_API_KEY` is tolerated.
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    /// Output token cap for providers that require one.
    pub max_tokens: u32,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_base_url: None,
            anthropic_base_url: None,
            gemini_base_url: None,
            max_tokens: 8192,
        }
    }
}
