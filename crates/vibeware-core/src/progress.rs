//! Progress reporting for the generation workflow.
//!
//! The `ProgressHandler` trait abstracts over how workflow progress is shown,
//! allowing for different output strategies (console, quiet, test recorders).

use crate::completion::CompletionError;
use crate::validation::ValidationResult;
use std::path::Path;
use vibeware_proto::GameName;

/// Receives workflow milestones as a generation request runs.
pub trait ProgressHandler: Send {
    /// Called once before the first attempt.
    fn on_start(&mut self, name: &GameName, model: &str);

    /// Called at the start of every attempt (1-based).
    fn on_attempt(&mut self, attempt: u32, max_attempts: u32);

    /// Called before the completion request is sent.
    fn on_request_started(&mut self, model: &str);

    /// Called when the completion request returns, successfully or not.
    fn on_request_finished(&mut self);

    /// Called when an attempt is abandoned before validation.
    fn on_attempt_failed(&mut self, reason: &str);

    /// Called after generated code was written to disk.
    fn on_code_written(&mut self, path: &Path);

    /// Called with the checker's verdict.
    fn on_validation(&mut self, result: &ValidationResult);

    /// Called when the registry refused the game after validation passed.
    fn on_registry_rejected(&mut self, name: &GameName);

    /// Called when a failed attempt's source file was deleted.
    fn on_artifact_deleted(&mut self, path: &Path);

    /// Called when a failed attempt overwrote an existing file and its old
    /// content was written back.
    fn on_artifact_restored(&mut self, path: &Path);

    /// Called when the requested name is already registered.
    fn on_already_registered(&mut self, name: &GameName);

    /// Called when the game was validated and registered.
    fn on_success(&mut self, name: &GameName);

    /// Called when the attempt budget ran out.
    fn on_exhausted(&mut self, name: &GameName, attempts: u32);

    /// Called when a credential problem stopped the request.
    fn on_fatal(&mut self, error: &CompletionError);
}

/// Suppresses all progress output (for tests and scripted runs).
pub struct QuietProgress;

impl ProgressHandler for QuietProgress {
    fn on_start(&mut self, _: &GameName, _: &str) {}
    fn on_attempt(&mut self, _: u32, _: u32) {}
    fn on_request_started(&mut self, _: &str) {}
    fn on_request_finished(&mut self) {}
    fn on_attempt_failed(&mut self, _: &str) {}
    fn on_code_written(&mut self, _: &Path) {}
    fn on_validation(&mut self, _: &ValidationResult) {}
    fn on_registry_rejected(&mut self, _: &GameName) {}
    fn on_artifact_deleted(&mut self, _: &Path) {}
    fn on_artifact_restored(&mut self, _: &Path) {}
    fn on_already_registered(&mut self, _: &GameName) {}
    fn on_success(&mut self, _: &GameName) {}
    fn on_exhausted(&mut self, _: &GameName, _: u32) {}
    fn on_fatal(&mut self, _: &CompletionError) {}
}

/// Shortens checker output to `max_chars` characters, marking the cut with `...`.
///
/// Counts characters, not bytes, so multi-byte output is never split.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
