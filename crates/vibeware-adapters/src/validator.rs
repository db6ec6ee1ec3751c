//! External checker invocation.
//!
//! The project ships its own structural checker (by default
//! `node validateGames.cjs NAME`). It runs in the project root with no stdin
//! and no timeout; exit status 0 means the game passed.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};
use vibeware_core::{ValidationResult, Validator, ValidatorConfig};
use vibeware_proto::GameName;

/// Runs a configured command with the game name as its last argument.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    command: Vec<String>,
    project_root: PathBuf,
}

impl CommandValidator {
    pub fn new(command: Vec<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            command,
            project_root: project_root.into(),
        }
    }

    pub fn from_config(config: &ValidatorConfig, project_root: impl Into<PathBuf>) -> Self {
        Self::new(config.command.clone(), project_root)
    }
}

#[async_trait]
impl Validator for CommandValidator {
    async fn validate(&self, name: &GameName) -> ValidationResult {
        let Some((program, args)) = self.command.split_first() else {
            return ValidationResult::failed("Validation error: no validator command configured");
        };

        debug!(program = %program, ?args, game = %name, "Running validator");

        let output = Command::new(program)
            .args(args)
            .arg(name.as_str())
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                debug!(game = %name, status = ?output.status, "Validator finished");
                ValidationResult {
                    success: output.status.success(),
                    output: text,
                }
            }
            Err(e) => {
                warn!(program = %program, error = %e, "Could not launch validator");
                ValidationResult::failed(format!("Validation error: {e}"))
            }
        }
    }
}
