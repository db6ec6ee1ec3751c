//! Interactive wizard.
//!
//! Asks for one game's details on stdin and normalizes them into a
//! [`GameSpec`]. Reader and writer are generic so the flow can be driven from
//! tests.

use std::io::{self, BufRead, Write};
use vibeware_proto::{GameName, GameSpec};

/// Model used when the menu answer is empty or unknown.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Preset entries of the model menu: (choice, model, label).
pub const MODEL_MENU: [(&str, &str, &str); 3] = [
    ("1", "gpt-4o", "GPT-4o (default, requires OPENAI_API_KEY)"),
    ("2", "claude-3-7-sonnet-latest", "Claude 3.7 Sonnet (requires ANTHROPIC_API_KEY)"),
    ("3", "gemini-2.5-pro-exp-03-25", "Gemini 2.5 Pro (requires GOOGLE_API_KEY)"),
];

const CUSTOM_CHOICE: &str = "4";

/// What the model menu answer selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Preset(&'static str),
    Custom,
}

/// Maps a menu answer to a model. Unknown answers select the default.
pub fn model_for_choice(choice: &str) -> ModelChoice {
    let choice = choice.trim();
    if choice == CUSTOM_CHOICE {
        return ModelChoice::Custom;
    }
    MODEL_MENU
        .iter()
        .find(|(key, _, _)| *key == choice)
        .map_or(ModelChoice::Preset(DEFAULT_MODEL), |&(_, model, _)| ModelChoice::Preset(model))
}

/// Upper-cases the player prompt and makes sure it ends with `!`.
pub fn normalize_prompt(raw: &str) -> String {
    let mut prompt = raw.trim().to_uppercase();
    if !prompt.ends_with('!') {
        prompt.push('!');
    }
    prompt
}

/// A completed wizard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardOutcome {
    pub spec: GameSpec,
    pub model: String,
}

pub struct Wizard<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Runs the wizard.
    ///
    /// Returns `None` when the name is empty or not a valid class name; the
    /// reason has already been printed. With `model` set, the model menu is
    /// skipped.
    pub fn run(&mut self, model: Option<&str>) -> io::Result<Option<WizardOutcome>> {
        writeln!(self.output, "\n🧙 Running in WIZARD mode")?;
        writeln!(self.output, "Enter microgame details interactively...\n")?;

        let answer = self.ask("Game class name (e.g., ClickGame): ")?;
        if answer.is_empty() {
            writeln!(self.output, "❌ Name is required")?;
            return Ok(None);
        }
        let name = match GameName::parse_with_suffix(&answer) {
            Ok(name) => name,
            Err(e) => {
                writeln!(self.output, "❌ {e}")?;
                return Ok(None);
            }
        };
        if name.as_str() != answer {
            writeln!(self.output, "📝 Updated name to: {name}")?;
        }

        let prompt = normalize_prompt(&self.ask("Player prompt (e.g., CLICK!): ")?);
        let description = self.ask("Game description: ")?;
        let controls = self.ask("Controls (e.g., Mouse: Click on targets): ")?;
        let game_idea = self.ask("Detailed game concept: ")?;

        let model = match model {
            Some(model) => model.to_string(),
            None => self.choose_model()?,
        };

        Ok(Some(WizardOutcome {
            spec: GameSpec {
                name,
                prompt,
                description,
                controls,
                game_idea,
                style: None,
            },
            model,
        }))
    }

    fn choose_model(&mut self) -> io::Result<String> {
        writeln!(self.output, "\nSelect AI model:")?;
        for (key, _, label) in MODEL_MENU {
            writeln!(self.output, "{key}. {label}")?;
        }
        writeln!(self.output, "{CUSTOM_CHOICE}. Custom (enter your own)")?;

        match model_for_choice(&self.ask("\nChoice [1]: ")?) {
            ModelChoice::Preset(model) => Ok(model.to_string()),
            ModelChoice::Custom => {
                let custom = self.ask("Enter model name: ")?;
                Ok(if custom.is_empty() { DEFAULT_MODEL.to_string() } else { custom })
            }
        }
    }

    /// Prints `prompt` and reads one trimmed line. End of input reads as empty.
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Asks a yes/no question; only `y` (any case) confirms.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    write!(output, "{question} (y/N): ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
