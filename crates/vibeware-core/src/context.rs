//! Loads the template and documentation files embedded in the system prompt.
//!
//! Loading is best-effort: a missing or unreadable file contributes an empty
//! string instead of an error.

use crate::config::PathsConfig;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Logical name of the base scene template.
pub const BASE_MICROGAME: &str = "base_microgame";
/// Logical name of the example game.
pub const EXAMPLE_GAME: &str = "example_game";
/// Logical name of the authoring instructions.
pub const INSTRUCTIONS: &str = "instructions";

/// Contents of the context files, keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    files: BTreeMap<String, String>,
}

impl ProjectContext {
    /// Reads the three fixed context files relative to `root`.
    pub fn load(root: &Path, paths: &PathsConfig) -> Self {
        Self::load_files(
            root,
            [
                (BASE_MICROGAME, paths.base_microgame.as_path()),
                (EXAMPLE_GAME, paths.example_game.as_path()),
                (INSTRUCTIONS, paths.instructions.as_path()),
            ],
        )
    }

    /// Reads an arbitrary mapping of logical names to paths.
    pub fn load_files<'a>(
        root: &Path,
        files: impl IntoIterator<Item = (&'a str, &'a Path)>,
    ) -> Self {
        let mut loaded = BTreeMap::new();

        for (key, relative) in files {
            let full_path = root.join(relative);
            let content = match std::fs::read_to_string(&full_path) {
                Ok(content) => {
                    debug!(
                        key,
                        path = %full_path.display(),
                        bytes = content.len(),
                        "Loaded context file"
                    );
                    content
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(
                        key,
                        path = %full_path.display(),
                        "Context file missing, using empty content"
                    );
                    String::new()
                }
                Err(e) => {
                    warn!(
                        key,
                        path = %full_path.display(),
                        error = %e,
                        "Could not read context file, using empty content"
                    );
                    String::new()
                }
            };
            loaded.insert(key.to_string(), content);
        }

        Self { files: loaded }
    }

    /// Builds a context from in-memory contents.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            files: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Returns the content for `key`, or an empty string if it was not loaded.
    pub fn get(&self, key: &str) -> &str {
        self.files.get(key).map_or("", String::as_str)
    }
}
