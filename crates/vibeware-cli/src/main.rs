//! # vibeware
//!
//! Generates WarioWare-style microgames for a Phaser project with a language
//! model, checks them with the project's validator and registers the ones that
//! pass.

mod auto;
mod manage;
mod wizard;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vibeware_adapters::{
    ApiKeys, CommandValidator, ConsoleProgress, HttpCompletionClient, Provider,
};
use vibeware_core::{
    CONFIG_FILE_NAME, GenerationWorkflow, ProjectContext, PromptBuilder, RegistryPatcher,
    VibewareConfig,
};
use wizard::Wizard;

/// Batches above this size ask for confirmation.
const LARGE_BATCH: i64 = 10;

#[derive(Parser, Debug)]
#[command(name = "vibeware", version, about = "VibeWare Microgame Generator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Auto mode: generate game ideas automatically
    #[arg(long)]
    auto: bool,

    /// AI model to use (default: gpt-4o, or generation.model from the config)
    #[arg(long)]
    model: Option<String>,

    /// Number of games to generate (only works with --auto)
    #[arg(short = 'n', long, default_value_t = 1, allow_negative_numbers = true)]
    count: i64,

    /// Attempts per game before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Game project root (default: current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Config file (default: vibeware.yml in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show full validator output and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the games in the registry
    List,

    /// Remove a game from the registry and delete its source file
    Remove {
        /// Game class name, e.g. SwatGame
        name: String,
    },
}

/// Resolved project settings shared by all commands.
struct Project {
    root: PathBuf,
    config: VibewareConfig,
}

impl Project {
    fn load(cli: &Cli) -> Result<Self> {
        let root = match &cli.project {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let config_path = cli.config.clone().unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
        let config = VibewareConfig::load(&config_path)?;
        debug!(root = %root.display(), config = %config_path.display(), "Loaded project settings");
        Ok(Self { root, config })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project = Project::load(&cli)?;

    match &cli.command {
        Some(Commands::List) => {
            let registry = RegistryPatcher::new(project.config.paths.registry_path(&project.root));
            manage::list(&registry, &mut io::stdout())?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Remove { name }) => {
            let complete = manage::remove(
                &project.root,
                &project.config.paths,
                name,
                &mut io::stdout(),
            )?;
            Ok(if complete { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        None => generate(&cli, project).await,
    }
}

/// `RUST_LOG` wins; otherwise `-v` selects debug and the default is warn.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn generate(cli: &Cli, project: Project) -> Result<ExitCode> {
    println!("{}", "🎮 VibeWare Microgame Generator".bold());
    println!("{}", "=".repeat(40));

    if cli.count > 1 && !cli.auto {
        bail!("--count/-n can only be used with --auto mode\n   Example: vibeware --auto -n 3");
    }
    if cli.count < 1 {
        bail!("--count must be at least 1");
    }
    if cli.count > LARGE_BATCH {
        let warning = format!(
            "⚠️  Warning: Generating more than {LARGE_BATCH} games at once may take a long time."
        );
        println!("\n{}", warning.yellow());
        let confirmed = wizard::confirm(
            &mut io::stdin().lock(),
            &mut io::stdout(),
            "Are you sure you want to continue?",
        )?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }
    let count = u32::try_from(cli.count).context("--count is too large")?;

    let keys = ApiKeys::from_env();
    if keys.is_empty() && project.config.providers.openai_base_url.is_none() {
        print_missing_keys_warning();
    }

    let Project { root, config } = project;
    let max_retries = cli.max_retries.unwrap_or(config.generation.max_retries);

    let client = Arc::new(HttpCompletionClient::new(keys, config.providers.clone()));
    let validator = Arc::new(CommandValidator::from_config(&config.validator, &root));
    let prompts = PromptBuilder::new(ProjectContext::load(&root, &config.paths));
    let workflow =
        GenerationWorkflow::new(client.clone(), validator, prompts, &root, config.paths.clone())
            .with_max_attempts(max_retries);

    let mut progress = ConsoleProgress::new(cli.verbose);

    if cli.auto {
        let model = cli.model.as_deref().unwrap_or(&config.generation.model);
        let summary = auto::run(
            &workflow,
            client.as_ref(),
            model,
            count,
            &mut progress,
            &mut io::stdout(),
        )
        .await?;
        return Ok(if summary.all_succeeded() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let outcome = Wizard::new(io::stdin().lock(), io::stdout()).run(cli.model.as_deref())?;
    let Some(outcome) = outcome else {
        return Ok(ExitCode::FAILURE);
    };

    let report = workflow.generate(&outcome.spec, &outcome.model, &mut progress).await;
    debug!(outcome = ?report.outcome, attempts = report.attempts, "Wizard generation finished");
    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_missing_keys_warning() {
    let mut out = io::stdout();
    let warning = "⚠️  Warning: No API key found in environment variables.".yellow();
    let _ = writeln!(out, "\n{warning}");
    let _ = writeln!(out, "Set one of the following:");
    for (provider, label) in Provider::ALL.into_iter().zip(["GPT-4o", "Claude", "Gemini"]) {
        let _ = writeln!(out, "  export {}='your-key-here' (for {label})", provider.env_var());
    }
    let _ = writeln!(out, "\nOr you can set a custom model that doesn't require these keys.\n");
}
