//! The generate-validate-commit workflow.
//!
//! One generation request runs a bounded number of attempts:
//!
//! ```text
//! Idle -> Generating -> Validating -> Committing -> Success
//!  |          |             |             |
//!  |          v             v             v
//!  |          +------> RetryCleanup <-----+
//!  |          |             |
//!  v          v             +--> Generating (attempts left) | Exhausted
//! AlreadyRegistered  FatalAbort
//! ```
//!
//! A name the registry already imports ends the request before anything is
//! written. The registry is only touched in `Committing`, after the checker
//! passed. Every path out of an attempt that does not end in `Success` puts
//! the source path back the way the request found it: a file the attempt
//! created is deleted, a file that was already there gets its old content back.

use crate::completion::{CompletionClient, CompletionError};
use crate::config::PathsConfig;
use crate::extract::extract_code;
use crate::progress::ProgressHandler;
use crate::prompt::{Conversation, PromptBuilder};
use crate::registry::{GameMetadata, RegistryPatcher};
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vibeware_proto::GameSpec;

/// Position of a generation request in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating { attempt: u32 },
    Validating { attempt: u32 },
    Committing { attempt: u32 },
    RetryCleanup { attempt: u32 },
    Success,
    Exhausted,
    FatalAbort,
    AlreadyRegistered,
}

/// Something that happened while in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationEvent {
    /// The conversation was built.
    PromptsBuilt,
    /// The registry already imports the requested name.
    NameTaken,
    /// Generated code was extracted and written.
    CodeWritten,
    /// The attempt produced nothing usable (empty output, transient error).
    AttemptFailed,
    /// Credentials are missing or rejected.
    CredentialFailure,
    ValidationPassed,
    ValidationFailed,
    RegistryUpdated,
    RegistryRejected,
    /// The attempt's leftovers were removed.
    CleanedUp,
}

impl GenerationState {
    /// Returns true once the request can make no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationState::Success
                | GenerationState::Exhausted
                | GenerationState::FatalAbort
                | GenerationState::AlreadyRegistered
        )
    }

    /// Applies `event` to this state.
    ///
    /// Events that do not apply to the current state leave it unchanged.
    pub fn next(self, event: GenerationEvent, max_attempts: u32) -> Self {
        use GenerationEvent as E;
        use GenerationState as S;

        match (self, event) {
            (S::Idle, E::NameTaken) => S::AlreadyRegistered,
            (S::Idle, E::PromptsBuilt) if max_attempts == 0 => S::Exhausted,
            (S::Idle, E::PromptsBuilt) => S::Generating { attempt: 1 },

            (S::Generating { attempt }, E::CodeWritten) => S::Validating { attempt },
            (S::Generating { attempt }, E::AttemptFailed) => S::RetryCleanup { attempt },
            (S::Generating { .. }, E::CredentialFailure) => S::FatalAbort,

            (S::Validating { attempt }, E::ValidationPassed) => S::Committing { attempt },
            (S::Validating { attempt }, E::ValidationFailed) => S::RetryCleanup { attempt },

            (S::Committing { .. }, E::RegistryUpdated) => S::Success,
            (S::Committing { attempt }, E::RegistryRejected) => S::RetryCleanup { attempt },

            (S::RetryCleanup { attempt }, E::CleanedUp) if attempt < max_attempts => S::Generating {
                attempt: attempt + 1,
            },
            (S::RetryCleanup { .. }, E::CleanedUp) => S::Exhausted,

            (state, _) => state,
        }
    }
}

/// How a generation request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The game was validated and registered.
    Success,
    /// Every attempt failed.
    Exhausted,
    /// Credentials were missing or rejected; carries the provider's message.
    FatalAbort(String),
    /// The name was already registered; nothing was generated.
    AlreadyRegistered,
}

/// Final report of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcome: GenerationOutcome,
    /// Number of attempts started.
    pub attempts: u32,
    /// Where the game source was written.
    pub artifact_path: PathBuf,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.outcome == GenerationOutcome::Success
    }
}

/// Drives generation requests through the state machine.
///
/// Requests run strictly one after another; the workflow owns the artifact
/// file and the registry edit for the request it is running.
pub struct GenerationWorkflow {
    client: Arc<dyn CompletionClient>,
    validator: Arc<dyn Validator>,
    registry: RegistryPatcher,
    prompts: PromptBuilder,
    project_root: PathBuf,
    paths: PathsConfig,
    max_attempts: u32,
}

/// Per-request mutable state threaded through the attempts.
struct Attempt {
    conversation: Conversation,
    artifact: PathBuf,
    /// Content of the source path before the request, if it existed.
    original: Option<Vec<u8>>,
    artifact_written: bool,
    fatal: Option<CompletionError>,
}

impl GenerationWorkflow {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        validator: Arc<dyn Validator>,
        prompts: PromptBuilder,
        project_root: impl Into<PathBuf>,
        paths: PathsConfig,
    ) -> Self {
        let project_root = project_root.into();
        let registry = RegistryPatcher::new(paths.registry_path(&project_root));
        Self {
            client,
            validator,
            registry,
            prompts,
            project_root,
            paths,
            max_attempts: 3,
        }
    }

    /// Sets the attempt budget per request.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn registry(&self) -> &RegistryPatcher {
        &self.registry
    }

    /// Runs one generation request to a terminal state.
    pub async fn generate(
        &self,
        spec: &GameSpec,
        model: &str,
        progress: &mut dyn ProgressHandler,
    ) -> GenerationReport {
        progress.on_start(&spec.name, model);

        let artifact = self.paths.artifact_path(&self.project_root, &spec.name);
        let mut attempt = Attempt {
            conversation: self.prompts.conversation(spec),
            original: std::fs::read(&artifact).ok(),
            artifact,
            artifact_written: false,
            fatal: None,
        };

        let mut attempts_started = 0;
        let mut state = GenerationState::Idle.next(self.check_name(spec), self.max_attempts);

        while !state.is_terminal() {
            let event = match state {
                GenerationState::Generating { attempt: n } => {
                    attempts_started = n;
                    progress.on_attempt(n, self.max_attempts);
                    self.run_generation(model, &mut attempt, progress).await
                }
                GenerationState::Validating { .. } => {
                    self.run_validation(spec, &mut attempt, progress).await
                }
                GenerationState::Committing { .. } => self.run_commit(spec, progress),
                GenerationState::RetryCleanup { .. } => {
                    Self::cleanup(&mut attempt, progress);
                    GenerationEvent::CleanedUp
                }
                GenerationState::Idle
                | GenerationState::Success
                | GenerationState::Exhausted
                | GenerationState::FatalAbort
                | GenerationState::AlreadyRegistered => break,
            };

            let next = state.next(event, self.max_attempts);
            debug!(game = %spec.name, from = ?state, ?event, to = ?next, "Workflow transition");
            state = next;
        }

        let outcome = match state {
            GenerationState::Success => {
                info!(game = %spec.name, attempts = attempts_started, "Generation succeeded");
                progress.on_success(&spec.name);
                GenerationOutcome::Success
            }
            GenerationState::FatalAbort => GenerationOutcome::FatalAbort(
                attempt.fatal.take().map(|e| e.to_string()).unwrap_or_default(),
            ),
            GenerationState::AlreadyRegistered => {
                warn!(game = %spec.name, "Game already exists in registry, nothing generated");
                progress.on_already_registered(&spec.name);
                GenerationOutcome::AlreadyRegistered
            }
            _ => {
                warn!(
                    game = %spec.name,
                    attempts = attempts_started,
                    "Generation exhausted its attempts"
                );
                progress.on_exhausted(&spec.name, attempts_started);
                GenerationOutcome::Exhausted
            }
        };

        GenerationReport {
            outcome,
            attempts: attempts_started,
            artifact_path: attempt.artifact,
        }
    }

    /// Looks the name up in the registry before any attempt runs.
    ///
    /// An unreadable registry is not decided here; the commit step reports it.
    fn check_name(&self, spec: &GameSpec) -> GenerationEvent {
        match self.registry.contains(&spec.name) {
            Ok(true) => GenerationEvent::NameTaken,
            Ok(false) => GenerationEvent::PromptsBuilt,
            Err(e) => {
                debug!(game = %spec.name, error = %e, "Could not check registry for the name");
                GenerationEvent::PromptsBuilt
            }
        }
    }

    async fn run_generation(
        &self,
        model: &str,
        attempt: &mut Attempt,
        progress: &mut dyn ProgressHandler,
    ) -> GenerationEvent {
        progress.on_request_started(model);
        let response = self.client.complete(model, attempt.conversation.messages()).await;
        progress.on_request_finished();

        let text = match response {
            Ok(text) => text,
            Err(e) if e.is_credential_error() => {
                warn!(error = %e, "Credential failure, aborting generation");
                progress.on_fatal(&e);
                attempt.fatal = Some(e);
                return GenerationEvent::CredentialFailure;
            }
            Err(e) => {
                warn!(error = %e, "Completion request failed");
                progress.on_attempt_failed(&e.to_string());
                return GenerationEvent::AttemptFailed;
            }
        };

        let code = extract_code(&text);
        if code.is_empty() {
            progress.on_attempt_failed(&CompletionError::EmptyResponse.to_string());
            return GenerationEvent::AttemptFailed;
        }

        match write_artifact(&attempt.artifact, &code) {
            Ok(()) => {
                attempt.artifact_written = true;
                progress.on_code_written(&attempt.artifact);
                GenerationEvent::CodeWritten
            }
            Err(e) => {
                let path = attempt.artifact.display();
                warn!(path = %path, error = %e, "Could not write generated code");
                progress.on_attempt_failed(&format!("could not write {path}: {e}"));
                GenerationEvent::AttemptFailed
            }
        }
    }

    async fn run_validation(
        &self,
        spec: &GameSpec,
        attempt: &mut Attempt,
        progress: &mut dyn ProgressHandler,
    ) -> GenerationEvent {
        let result = self.validator.validate(&spec.name).await;
        progress.on_validation(&result);

        if result.success {
            GenerationEvent::ValidationPassed
        } else {
            // Next attempt starts from the original two messages
            attempt.conversation.reset();
            GenerationEvent::ValidationFailed
        }
    }

    fn run_commit(&self, spec: &GameSpec, progress: &mut dyn ProgressHandler) -> GenerationEvent {
        if self.registry.update(&spec.name, &GameMetadata::from_spec(spec)) {
            GenerationEvent::RegistryUpdated
        } else {
            progress.on_registry_rejected(&spec.name);
            GenerationEvent::RegistryRejected
        }
    }

    fn cleanup(attempt: &mut Attempt, progress: &mut dyn ProgressHandler) {
        if !std::mem::take(&mut attempt.artifact_written) {
            return;
        }
        let path = &attempt.artifact;

        if let Some(original) = &attempt.original {
            match std::fs::write(path, original) {
                Ok(()) => {
                    info!(path = %path.display(), "Restored previous game source");
                    progress.on_artifact_restored(path);
                }
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not restore previous game source"
                ),
            }
            return;
        }

        match std::fs::remove_file(path) {
            Ok(()) => progress.on_artifact_deleted(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not delete generated file"),
        }
    }
}

fn write_artifact(path: &Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{code}\n"))
}
