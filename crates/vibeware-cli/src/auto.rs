//! Auto mode: let the model invent the games.
//!
//! One idea is picked at random and generated; several ideas are all
//! generated in order and summarized at the end.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::io::Write;
use vibeware_core::{
    CompletionClient, GenerationOutcome, GenerationWorkflow, ProgressHandler, generate_ideas,
};
use vibeware_proto::{GameName, GameSpec};

/// Result of an auto-mode run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AutoSummary {
    pub succeeded: Vec<GameName>,
    pub failed: Vec<GameName>,
}

impl AutoSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && !self.succeeded.is_empty()
    }
}

/// Generates `count` ideas and then the games themselves.
pub async fn run(
    workflow: &GenerationWorkflow,
    client: &dyn CompletionClient,
    model: &str,
    count: u32,
    progress: &mut dyn ProgressHandler,
    out: &mut dyn Write,
) -> Result<AutoSummary> {
    writeln!(out, "\n🤖 Running in AUTO mode")?;
    writeln!(out, "Generating creative game ideas...\n")?;

    let ideas = generate_ideas(client, model, count)
        .await
        .context("Failed to generate game ideas")?;

    write!(out, "{}", format_ideas(&ideas))?;

    let mut summary = AutoSummary::default();

    if count == 1 {
        let Some(selected) = ideas.choose(&mut rand::thread_rng()) else {
            return Ok(summary);
        };
        writeln!(out, "\n🎲 Randomly selected: {}", selected.name)?;
        writeln!(out, "   {}", selected.description)?;
        writeln!(out, "\n{}", "=".repeat(60))?;
        writeln!(out, "🎮 Generating {}...", selected.name)?;
        writeln!(out, "{}", "=".repeat(60))?;

        let report = workflow.generate(selected, model, progress).await;
        if report.is_success() {
            writeln!(out, "\n🎉 Auto-generated game complete!")?;
            write!(out, "{}", format_details(selected))?;
            summary.succeeded.push(selected.name.clone());
        } else {
            summary.failed.push(selected.name.clone());
        }
        return Ok(summary);
    }

    writeln!(out, "\n🎮 Generating {} games...", ideas.len())?;
    writeln!(out, "{}", "=".repeat(60))?;

    let total = ideas.len();
    for (i, idea) in ideas.iter().enumerate() {
        writeln!(out, "\n[{}/{total}] Generating {}...", i + 1, idea.name)?;
        writeln!(out, "{}", "-".repeat(40))?;

        let report = workflow.generate(idea, model, progress).await;
        match report.outcome {
            GenerationOutcome::Success => summary.succeeded.push(idea.name.clone()),
            GenerationOutcome::Exhausted | GenerationOutcome::AlreadyRegistered => {
                summary.failed.push(idea.name.clone());
            }
            GenerationOutcome::FatalAbort(_) => {
                // Credentials are shared by every remaining idea
                summary.failed.extend(ideas[i..].iter().map(|idea| idea.name.clone()));
                break;
            }
        }
    }

    write!(out, "{}", format_summary(&summary, total))?;
    Ok(summary)
}

/// Lists the generated ideas.
pub fn format_ideas(ideas: &[GameSpec]) -> String {
    let mut text = String::from("\n📋 Generated Game Ideas:\n");
    text.push_str(&"-".repeat(60));
    text.push('\n');
    for (i, idea) in ideas.iter().enumerate() {
        text.push_str(&format!("\n{}. {}\n", i + 1, idea.name));
        text.push_str(&format!("   Prompt: {}\n", idea.prompt));
        text.push_str(&format!("   Description: {}\n", idea.description));
        text.push_str(&format!("   Style: {}\n", idea.style_or_default()));
    }
    text
}

fn format_details(spec: &GameSpec) -> String {
    format!(
        "\nGame Details:\n- Name: {}\n- Prompt: {}\n- Description: {}\n- Controls: {}\n- Style: {}\n",
        spec.name,
        spec.prompt,
        spec.description,
        spec.controls,
        spec.style_or_default()
    )
}

/// Renders the batch summary.
pub fn format_summary(summary: &AutoSummary, total: usize) -> String {
    let rule = "=".repeat(60);
    let mut text = format!("\n{rule}\n🎯 GENERATION SUMMARY\n{rule}\n");

    text.push_str(&format!("\n✅ Successfully generated: {} games\n", summary.succeeded.len()));
    for name in &summary.succeeded {
        text.push_str(&format!("   - {name}\n"));
    }

    if !summary.failed.is_empty() {
        text.push_str(&format!("\n❌ Failed to generate: {} games\n", summary.failed.len()));
        for name in &summary.failed {
            text.push_str(&format!("   - {name}\n"));
        }
    }

    text.push_str(&format!(
        "\n🎉 Batch generation complete! ({}/{total} successful)\n",
        summary.succeeded.len()
    ));
    text
}
