//! Game name type.
//!
//! A game name is the class name of the generated scene, its registry key and
//! the stem of its source file. It must be a valid TypeScript identifier and is
//! conventionally suffixed with `Game` (e.g. `CatchGame`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));

/// Conventional suffix for every microgame class name.
pub const GAME_SUFFIX: &str = "Game";

/// Error returned when a string is not a usable game name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid game name {0:?}: must be a TypeScript identifier such as `CatchGame`")]
pub struct InvalidGameName(pub String);

/// A validated microgame class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameName(String);

impl GameName {
    /// Parses a game name, rejecting anything that is not an identifier.
    pub fn parse(name: impl Into<String>) -> Result<Self, InvalidGameName> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(InvalidGameName(name))
        }
    }

    /// Parses a name, appending the `Game` suffix when it is missing.
    pub fn parse_with_suffix(name: &str) -> Result<Self, InvalidGameName> {
        let name = name.trim();
        if name.ends_with(GAME_SUFFIX) {
            Self::parse(name)
        } else {
            Self::parse(format!("{name}{GAME_SUFFIX}"))
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the human-readable title used in the registry metadata.
    ///
    /// A space goes before every `Game`, underscores become spaces, then each
    /// word is capitalized with the remainder lower-cased:
    /// `CatchGame` becomes `Catch Game`, `super_jumpGame` becomes `Super Jump Game`.
    pub fn display_name(&self) -> String {
        self.0
            .replace(GAME_SUFFIX, " Game")
            .replace('_', " ")
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl TryFrom<String> for GameName {
    type Error = InvalidGameName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for GameName {
    type Error = InvalidGameName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<GameName> for String {
    fn from(name: GameName) -> Self {
        name.0
    }
}

impl AsRef<str> for GameName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
