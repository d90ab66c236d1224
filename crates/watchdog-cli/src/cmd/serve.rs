use crate::settings::Settings;
use anyhow::anyhow;
use std::sync::Arc;
use watchdog_core::config::{Config, Credential, WarnLevel};
use watchdog_core::dispatch::{Dispatcher, DryRunDispatcher, GitHubDispatcher};
use watchdog_core::engine::DecisionEngine;

/// Command-line overrides applied on top of the config file.
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
    pub dry_run: bool,
}

pub fn run(settings: Settings, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = settings.config.clone();
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(token) = args.token.filter(|t| !t.trim().is_empty()) {
        config.dispatch.token = Some(Credential::new(token));
    }
    if args.dry_run {
        config.dispatch.dry_run = true;
    }

    let warnings = config.validate();
    for w in &warnings {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }
    if Config::has_errors(&warnings) {
        anyhow::bail!("config validation found errors");
    }

    let dispatcher = build_dispatcher(&config)?;
    let settings = Settings { config, ..settings };
    let engine = DecisionEngine::new(settings.checkpoint_store(), dispatcher)
        .watching(settings.config.watch.app.clone());
    let addr = settings.config.listen.addr();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tokio::select! {
            res = watchdog_server::serve_on(engine, listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}

fn build_dispatcher(config: &Config) -> anyhow::Result<Arc<dyn Dispatcher>> {
    if config.dispatch.dry_run {
        tracing::warn!("dry run enabled: rollbacks will be logged, not sent");
        return Ok(Arc::new(DryRunDispatcher));
    }
    let token = config
        .dispatch
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            anyhow!("no dispatch token: pass --token, set WATCHDOG_TOKEN, or use --dry-run")
        })?;
    let dispatcher = GitHubDispatcher::new(&config.dispatch, token)?;
    tracing::info!(url = dispatcher.url(), "rollbacks will be dispatched");
    Ok(Arc::new(dispatcher))
}
