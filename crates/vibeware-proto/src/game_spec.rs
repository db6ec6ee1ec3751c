//! Game specification types.

use crate::GameName;
use serde::{Deserialize, Serialize};

/// Description of one microgame to generate.
///
/// Entered by the user in the wizard or produced by the idea generator; it is
/// consumed once per generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSpec {
    /// Class name, registry key and file stem.
    pub name: GameName,
    /// Short instruction shown to the player when the game starts, e.g. `CATCH!`.
    pub prompt: String,
    /// One-line description of what happens.
    pub description: String,
    /// How the player controls the game.
    pub controls: String,
    /// Detailed concept: objective, mechanics and visual style.
    pub game_idea: String,
    /// Visual style and palette, when the idea generator supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl GameSpec {
    /// Returns the style, or a placeholder when none was given.
    pub fn style_or_default(&self) -> &str {
        self.style.as_deref().unwrap_or("Not specified")
    }
}
