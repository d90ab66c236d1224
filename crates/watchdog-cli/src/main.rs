mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use cmd::{checkpoint::CheckpointSubcommand, config::ConfigSubcommand, serve::ServeArgs};
use std::path::PathBuf;
use watchdog_core::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(
    name = "watchdog",
    about = "Deployment health watchdog: remember the last healthy revision, roll back when degraded",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(long, global = true, env = "WATCHDOG_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive health webhooks and trigger rollbacks
    Serve {
        /// Address to bind (overrides listen.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides listen.port; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,

        /// Credential for the rollback dispatch
        #[arg(long, env = "WATCHDOG_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Token variable used by earlier deployments
        #[arg(long, env = "GH_PAT_WEBHOOK", hide = true, hide_env_values = true)]
        legacy_token: Option<String>,

        /// Log rollback intents instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect or override the recorded healthy revision
    Checkpoint {
        #[command(subcommand)]
        subcommand: CheckpointSubcommand,
    },

    /// Create, validate, or show the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = settings::Settings::load(&cli.config).and_then(|settings| match cli.command {
        Commands::Serve {
            host,
            port,
            token,
            legacy_token,
            dry_run,
        } => cmd::serve::run(
            settings,
            ServeArgs {
                host,
                port,
                token: token.or(legacy_token),
                dry_run,
            },
        ),
        Commands::Checkpoint { subcommand } => cmd::checkpoint::run(&settings, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&settings, subcommand, cli.json),
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
