//! Console progress output.
//!
//! In normal mode, shows attempt milestones and a spinner while a completion
//! request is in flight. Checker output is truncated unless verbose.

use crate::provider::Provider;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use vibeware_core::{CompletionError, ProgressHandler, ValidationResult, truncate};
use vibeware_proto::GameName;

/// Checker output shown in non-verbose mode, in characters.
const VALIDATION_PREVIEW_CHARS: usize = 2000;

/// Writes workflow progress to stdout.
pub struct ConsoleProgress {
    verbose: bool,
    out: Box<dyn Write + Send>,
    spinner: Option<ProgressBar>,
    model: String,
}

impl ConsoleProgress {
    /// Creates a console handler.
    ///
    /// # Arguments
    /// * `verbose` - If true, shows the checker's full output.
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(verbose, io::stdout())
    }

    /// Creates a handler writing to `out`.
    pub fn with_writer(verbose: bool, out: impl Write + Send + 'static) -> Self {
        Self {
            verbose,
            out: Box::new(out),
            spinner: None,
            model: String::new(),
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl ProgressHandler for ConsoleProgress {
    fn on_start(&mut self, name: &GameName, model: &str) {
        model.clone_into(&mut self.model);
        let _ = writeln!(self.out, "\n🎮 Generating {} using {}...", name.as_str().bold(), model);
    }

    fn on_attempt(&mut self, attempt: u32, max_attempts: u32) {
        let _ = writeln!(self.out, "\n📝 Attempt {attempt}/{max_attempts}");
    }

    fn on_request_started(&mut self, model: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Waiting for {model}..."));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn on_request_finished(&mut self) {
        self.stop_spinner();
    }

    fn on_attempt_failed(&mut self, reason: &str) {
        let _ = writeln!(self.out, "{} {reason}", "❌".red());
    }

    fn on_code_written(&mut self, path: &Path) {
        let _ = writeln!(self.out, "✅ Code generated and saved to {}", path.display());
        let _ = writeln!(self.out, "\n🔍 Running validation...");
    }

    fn on_validation(&mut self, result: &ValidationResult) {
        let output = result.output.trim_end();
        if !output.is_empty() {
            if self.verbose {
                let _ = writeln!(self.out, "{output}");
            } else {
                let _ = writeln!(self.out, "{}", truncate(output, VALIDATION_PREVIEW_CHARS));
            }
        }

        if result.success {
            let message = "✅ Validation passed! Updating registry...".green();
            let _ = writeln!(self.out, "\n{message}");
        } else {
            let message = "❌ Validation failed, cleaning up and retrying...".red();
            let _ = writeln!(self.out, "\n{message}");
        }
    }

    fn on_registry_rejected(&mut self, name: &GameName) {
        let _ = writeln!(self.out, "{}", format!("❌ Failed to update registry for {name}").red());
    }

    fn on_artifact_deleted(&mut self, path: &Path) {
        let _ = writeln!(self.out, "🗑️  Deleted generated file: {}", path.display());
    }

    fn on_artifact_restored(&mut self, path: &Path) {
        let _ = writeln!(self.out, "↩️  Restored previous file: {}", path.display());
    }

    fn on_already_registered(&mut self, name: &GameName) {
        let _ = writeln!(
            self.out,
            "{}",
            format!("❌ {name} already exists in registry, nothing was generated").red()
        );
        let _ = writeln!(
            self.out,
            "   Pick another name, or run `vibeware remove {name}` to replace it"
        );
    }

    fn on_success(&mut self, name: &GameName) {
        let _ = writeln!(
            self.out,
            "\n{}",
            format!("✅ {name} successfully generated and validated!").green().bold()
        );
        let _ = writeln!(self.out, "\n🎮 You can now test your game by running: npm run dev");
        let _ = writeln!(
            self.out,
            "   Then press 'D' on the title screen to access the debug menu"
        );
    }

    fn on_exhausted(&mut self, name: &GameName, attempts: u32) {
        let _ = writeln!(
            self.out,
            "\n{}",
            format!("❌ Failed to generate valid {name} after {attempts} attempts").red()
        );
    }

    fn on_fatal(&mut self, error: &CompletionError) {
        self.stop_spinner();
        let _ = writeln!(self.out, "{}", format!("❌ Error: {error}").red());
        let env_var = credential_env_var(error, &self.model);
        let _ = writeln!(
            self.out,
            "\n💡 Tip: Make sure you have set your API key as an environment variable:"
        );
        let _ = writeln!(self.out, "   export {env_var}='your-key-here'");
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

/// Names the environment variable to set for a credential failure.
pub fn credential_env_var(error: &CompletionError, model: &str) -> &'static str {
    match error {
        CompletionError::MissingApiKey { env_var, .. } => *env_var,
        _ => Provider::for_model(model).env_var(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared buffer so the test can read what the handler wrote.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn name() -> GameName {
        GameName::parse("SwatGame").unwrap()
    }

    #[test]
    fn test_success_prints_hints() {
        colored::control::set_override(false);
        let capture = Capture::default();
        let mut handler = ConsoleProgress::with_writer(false, capture.clone());

        handler.on_start(&name(), "gpt-4o");
        handler.on_attempt(1, 3);
        handler.on_success(&name());

        let text = capture.text();
        assert!(text.contains("Generating SwatGame using gpt-4o"));
        assert!(text.contains("Attempt 1/3"));
        assert!(text.contains("SwatGame successfully generated and validated!"));
        assert!(text.contains("npm run dev"));
        assert!(text.contains("press 'D' on the title screen"));
    }

    #[test]
    fn test_validation_output_truncated_unless_verbose() {
        colored::control::set_override(false);
        let long = "x".repeat(VALIDATION_PREVIEW_CHARS + 50);

        let capture = Capture::default();
        let mut quiet = ConsoleProgress::with_writer(false, capture.clone());
        quiet.on_validation(&ValidationResult::failed(long.clone()));
        assert!(capture.text().contains(&format!("{}...", "x".repeat(VALIDATION_PREVIEW_CHARS))));
        assert!(!capture.text().contains(&long));

        let capture = Capture::default();
        let mut verbose = ConsoleProgress::with_writer(true, capture.clone());
        verbose.on_validation(&ValidationResult::passed(long.clone()));
        assert!(capture.text().contains(&long));
        assert!(capture.text().contains("Validation passed"));
    }

    #[test]
    fn test_fatal_names_env_var() {
        colored::control::set_override(false);
        let capture = Capture::default();
        let mut handler = ConsoleProgress::with_writer(false, capture.clone());

        handler.on_start(&name(), "claude-3-7-sonnet-latest");
        handler.on_fatal(&CompletionError::AuthenticationFailed {
            provider: "Anthropic",
            status: 401,
            body: "invalid x-api-key".to_string(),
        });

        assert!(capture.text().contains("export ANTHROPIC_API_KEY='your-key-here'"));
    }

    #[test]
    fn test_already_registered_suggests_remove() {
        colored::control::set_override(false);
        let capture = Capture::default();
        let mut handler = ConsoleProgress::with_writer(false, capture.clone());

        handler.on_already_registered(&name());

        let text = capture.text();
        assert!(text.contains("SwatGame already exists in registry"));
        assert!(text.contains("vibeware remove SwatGame"));
    }

    #[test]
    fn test_credential_env_var_prefers_error() {
        let err = CompletionError::MissingApiKey {
            provider: "Gemini",
            env_var: "GOOGLE_API_KEY",
        };
        assert_eq!(credential_env_var(&err, "gpt-4o"), "GOOGLE_API_KEY");
        assert_eq!(credential_env_var(&CompletionError::EmptyResponse, "gpt-4o"), "OPENAI_API_KEY");
    }
}
