use crate::output::print_json;
use crate::settings::Settings;
use anyhow::Context;
use clap::Subcommand;
use watchdog_core::config::{Config, WarnLevel};

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the config for common mistakes
    Validate,

    /// Print the effective config with the credential masked
    Show,
}

pub fn run(settings: &Settings, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(settings, force),
        ConfigSubcommand::Validate => validate(settings, json),
        ConfigSubcommand::Show => show(settings, json),
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(settings: &Settings, force: bool) -> anyhow::Result<()> {
    let path = &settings.config_path;
    let data = serde_yaml::to_string(&Config::default())?;
    let written = if force {
        watchdog_core::io::atomic_write(path, data.as_bytes()).map(|_| true)
    } else {
        watchdog_core::io::write_if_missing(path, data.as_bytes())
    }
    .with_context(|| format!("failed to write {}", path.display()))?;

    if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let warnings = settings.config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if Config::has_errors(&warnings) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let redacted = settings.config.redacted();
    if json {
        print_json(&redacted)
    } else {
        print!("{}", serde_yaml::to_string(&redacted)?);
        Ok(())
    }
}
