//! # vibeware-proto
//!
//! Shared vocabulary for VibeWare Forge: validated game names, the game
//! specification handed to the generator, and the chat messages exchanged with
//! completion providers.

mod game_name;
mod game_spec;
mod message;

pub use game_name::{GAME_SUFFIX, GameName, InvalidGameName};
pub use game_spec::GameSpec;
pub use message::{ChatMessage, Role};
