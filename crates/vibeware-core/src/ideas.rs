//! Game idea generation.
//!
//! A single request asks the model for `count` game specs as JSON. There is no
//! retry: any completion, parse or shape problem is returned to the caller.

use crate::completion::{CompletionClient, CompletionError};
use crate::extract::extract_code;
use serde_json::Value;
use tracing::{debug, info};
use vibeware_proto::{ChatMessage, GameSpec};

const IDEA_SYSTEM_PROMPT: &str = "You are a creative game designer specializing in quick, funny microgames like WarioWare. Respond only with valid JSON.";

/// Errors from idea generation.
#[derive(Debug, thiserror::Error)]
pub enum IdeaError {
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("model did not return valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("idea {index} is not a valid game spec: {source}")]
    InvalidIdea {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid response format: expected a JSON object or a non-empty array, got {0}")]
    InvalidShape(&'static str),
}

/// Asks `model` for `count` game ideas.
pub async fn generate_ideas(
    client: &dyn CompletionClient,
    model: &str,
    count: u32,
) -> Result<Vec<GameSpec>, IdeaError> {
    let messages = [
        ChatMessage::system(IDEA_SYSTEM_PROMPT),
        ChatMessage::user(idea_prompt(count)),
    ];

    let content = client.complete(model, &messages).await?;
    let ideas = parse_ideas(&content)?;
    info!(requested = count, received = ideas.len(), "Generated game ideas");
    Ok(ideas)
}

/// Parses the model's answer into game specs.
///
/// Markdown fences are stripped first. A single object becomes a one-element
/// list.
pub fn parse_ideas(content: &str) -> Result<Vec<GameSpec>, IdeaError> {
    let json = extract_code(content);
    debug!(bytes = json.len(), "Parsing idea JSON");

    let items = match serde_json::from_str::<Value>(&json).map_err(IdeaError::Parse)? {
        object @ Value::Object(_) => vec![object],
        Value::Array(items) if !items.is_empty() => items,
        Value::Array(_) => return Err(IdeaError::InvalidShape("an empty array")),
        Value::Null => return Err(IdeaError::InvalidShape("null")),
        Value::Bool(_) => return Err(IdeaError::InvalidShape("a boolean")),
        Value::Number(_) => return Err(IdeaError::InvalidShape("a number")),
        Value::String(_) => return Err(IdeaError::InvalidShape("a string")),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| IdeaError::InvalidIdea { index, source })
        })
        .collect()
}

/// Builds the user prompt asking for `count` ideas.
pub fn idea_prompt(count: u32) -> String {
    let plural = count > 1;
    let s = if plural { "s" } else { "" };
    let format = if plural { "an array of JSON objects" } else { "a JSON object" };
    let (open, close) = if plural { ("[", "]") } else { ("", "") };
    let unique = if plural {
        "\n- Make sure each game idea is unique and different from the others"
    } else {
        ""
    };

    format!(
        r#"We are making our own version of Wario Ware. Please generate {count} unique microgame idea{s} with the following:
- Controls (we're using PC, so keyboard and mouse are the main options). You can be creative with the input types
- Game objective - How do you win or lose?
- What is the prompt that appears on the screen? At the beginning of the game, there should be a prompt that instructs the player what to do. i.e. Jump, Clean, Survive, etc.

The games should all be very short in nature. i.e. 3-10 seconds. Clearly detail the description, style, and humor of the games. For style, name a color palette i.e. pixel art, classic, 3d, n64 graphics, etc.

Format your response as {format} with the following fields:
{open}{{
  "name": "GameNameGame",
  "prompt": "ACTION!",
  "description": "Brief description of what happens",
  "controls": "How to control (e.g., Mouse, Keyboard, Arrow Keys)",
  "game_idea": "Detailed game concept including visual style, objective, and mechanics",
  "style": "Visual style and color palette"
}}{close}

IMPORTANT:
- Each name must end with "Game" and be a valid TypeScript class name (no spaces)
- Prompts should be 1-2 words ending with !
- Be creative and humorous like WarioWare games
- Keep mechanics simple - remember players only have 3-5 seconds!{unique}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"{
        "name": "SneezeGame",
        "prompt": "HOLD IT!",
        "description": "Don't sneeze on the cake",
        "controls": "Space",
        "game_idea": "Mash space to suppress the sneeze",
        "style": "Pastel pixel art"
    }"#;

    #[test]
    fn test_single_object_becomes_list() {
        let ideas = parse_ideas(ONE).unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].name.as_str(), "SneezeGame");
        assert_eq!(ideas[0].style.as_deref(), Some("Pastel pixel art"));
    }

    #[test]
    fn test_fenced_array() {
        let content = format!(
            "Here you go!\n```json\n[{ONE}, {}]\n```",
            ONE.replace("SneezeGame", "CoughGame")
        );
        let ideas = parse_ideas(&content).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[1].name.as_str(), "CoughGame");
    }

    #[test]
    fn test_empty_array_is_error() {
        assert!(matches!(parse_ideas("[]"), Err(IdeaError::InvalidShape(_))));
    }

    #[test]
    fn test_scalar_is_error() {
        assert!(matches!(parse_ideas("42"), Err(IdeaError::InvalidShape("a number"))));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(parse_ideas("not json at all"), Err(IdeaError::Parse(_))));
    }

    #[test]
    fn test_missing_field_is_error() {
        let err = parse_ideas(r#"[{"name": "AGame"}]"#).unwrap_err();
        assert!(matches!(err, IdeaError::InvalidIdea { index: 0, .. }));
    }

    #[test]
    fn test_prompt_singular_and_plural() {
        let one = idea_prompt(1);
        assert!(one.contains("generate 1 unique microgame idea with"));
        assert!(one.contains("as a JSON object"));
        assert!(!one.contains("unique and different"));

        let many = idea_prompt(3);
        assert!(many.contains("generate 3 unique microgame ideas with"));
        assert!(many.contains("as an array of JSON objects"));
        assert!(many.contains("[{\n  \"name\": \"GameNameGame\""));
        assert!(many.contains("unique and different from the others"));
    }
}
