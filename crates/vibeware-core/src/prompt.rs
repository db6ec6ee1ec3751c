//! Prompt builder for microgame generation.
//!
//! The system prompt embeds the project context files and a fixed, numbered
//! list of authoring rules. The user prompt carries the requested game's
//! metadata. Both are deterministic for identical inputs.

use crate::context::{BASE_MICROGAME, EXAMPLE_GAME, INSTRUCTIONS, ProjectContext};
use vibeware_proto::{ChatMessage, GameSpec};

/// Canvas width every microgame lays out against.
pub const GAME_WIDTH: u32 = 800;
/// Canvas height every microgame lays out against.
pub const GAME_HEIGHT: u32 = 600;

/// Structural rules the generated scene must follow.
const AUTHORING_RULES: &[&str] = &[
    "Output ONLY the TypeScript code for the microgame class",
    "Class name MUST match the key passed to super()",
    "MUST have a constructor that calls super({ key: 'ClassName' }) where ClassName is your game class name",
    "MUST implement all abstract methods from BaseMicrogame",
    "MUST call setWinState() or setFailState() based on game outcome",
    "MUST clean up ALL event listeners in cleanupControls()",
    "Use GAME_WIDTH ({width}) and GAME_HEIGHT ({height}) for positioning",
    "Keep it simple - players have only 3-5 seconds",
    "Import Phaser like this: import Phaser from 'phaser'",
    "Import from correct paths: import BaseMicrogame from '../BaseMicrogame'",
    "BaseMicrogame extends Phaser.Scene, so after extending it you have access to all Phaser.Scene properties like this.add, this.physics, this.input, this.tweens, this.time, this.cameras, etc.",
    "MUST implement resetGameState() method (can be empty: resetGameState(): void {})",
    "Follow the exact pattern shown in the example game for constructor and imports",
    "When using physics groups or arcade physics, cast the body type appropriately: (object.body as Phaser.Physics.Arcade.Body)",
    "TypeScript knows about Phaser properties through inheritance - you DON'T need to declare properties like 'add', 'physics', etc. They come from Phaser.Scene",
    "When creating game objects, always specify their types: e.g., private mySprite!: Phaser.GameObjects.Sprite",
    "All of this code is within a single file, so don't expect to import anything from other files as part of this creation process",
    "The sprites and graphics of this game must all be created within the file. Make sure they look good.",
    "We don't have textures, so you'll need to draw graphics yourself.",
    "Upon winning a game, there should be some kind of victory animation or gag related to the game. Something funny and creative, not generic like a confetti explosion. Same thing for losing.",
];

/// Builds the two-message conversation for a generation request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    context: ProjectContext,
}

impl PromptBuilder {
    pub fn new(context: ProjectContext) -> Self {
        Self { context }
    }

    /// Builds the system prompt: role, context files, rules, output format.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are an expert TypeScript/Phaser game developer creating microgames for VibeWare.\n\n",
        );
        prompt.push_str(&self.context_section());
        prompt.push_str(&Self::rules_section());
        prompt.push_str(
            "Do not include any explanations, comments outside the code, or markdown code blocks.\n\
             Just output the pure TypeScript code.",
        );
        prompt
    }

    /// Builds the user prompt describing the requested game.
    pub fn user_prompt(&self, spec: &GameSpec) -> String {
        format!(
            r"Create a microgame called {name} with the following specifications:

Game Name: {name}
Prompt (shown to player): {prompt}
Description: {description}
Controls: {controls}
Game Concept: {idea}

Generate the complete TypeScript code for this microgame. The class name should be {name}.",
            name = spec.name,
            prompt = spec.prompt,
            description = spec.description,
            controls = spec.controls,
            idea = spec.game_idea,
        )
    }

    /// Builds the initial conversation for `spec`.
    pub fn conversation(&self, spec: &GameSpec) -> Conversation {
        Conversation::new(self.system_prompt(), self.user_prompt(spec))
    }

    fn context_section(&self) -> String {
        format!(
            r"CONTEXT FILES:

=== BaseMicrogame.ts (MUST EXTEND THIS) ===
{base}

=== Example game ===
{example}

=== Instructions ===
{instructions}

",
            base = self.context.get(BASE_MICROGAME),
            example = self.context.get(EXAMPLE_GAME),
            instructions = self.context.get(INSTRUCTIONS),
        )
    }

    fn rules_section() -> String {
        let rules = AUTHORING_RULES
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let rule = rule
                    .replace("{width}", &GAME_WIDTH.to_string())
                    .replace("{height}", &GAME_HEIGHT.to_string());
                format!("{}. {rule}", i + 1)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("CRITICAL REQUIREMENTS:\n{rules}\n\n")
    }
}

/// The message list sent to the completion client.
///
/// Keeps the two initial messages so a failed attempt can start over from a
/// clean slate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    initial: [ChatMessage; 2],
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        let initial = [ChatMessage::system(system), ChatMessage::user(user)];
        let messages = initial.to_vec();
        Self { initial, messages }
    }

    /// Current message list.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Drops everything except the original system and user messages.
    pub fn reset(&mut self) {
        self.messages = self.initial.to_vec();
    }
}
