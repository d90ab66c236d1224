use crate::output::print_json;
use crate::settings::Settings;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum CheckpointSubcommand {
    /// Show the last revision recorded as healthy
    Show,

    /// Overwrite the recorded healthy revision (manual recovery)
    Set {
        /// Revision identifier, e.g. a commit hash
        revision: String,
    },
}

pub fn run(settings: &Settings, subcmd: CheckpointSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CheckpointSubcommand::Show => show(settings, json),
        CheckpointSubcommand::Set { revision } => set(settings, &revision, json),
    }
}

fn show(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let revision = settings
        .checkpoint_store()
        .load()
        .context("failed to read checkpoint")?;

    if json {
        return print_json(&serde_json::json!({ "revision": revision }));
    }
    match revision {
        Some(r) => println!("{r}"),
        None => println!("No healthy revision recorded."),
    }
    Ok(())
}

fn set(settings: &Settings, revision: &str, json: bool) -> anyhow::Result<()> {
    if revision.trim().is_empty() {
        anyhow::bail!("revision must not be empty");
    }
    settings
        .checkpoint_store()
        .save(revision)
        .context("failed to write checkpoint")?;
    tracing::info!(revision, "checkpoint set manually");

    if json {
        print_json(&serde_json::json!({ "revision": revision }))
    } else {
        println!("Checkpoint set to {revision}");
        Ok(())
    }
}
