//! MedAssist - medical-advice chat assistant
//!
//! CLI entry point.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod bootstrap;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let config = bootstrap::load_config(cli.config.as_deref())?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "medassist=info,medassist_llm=info,medassist_memory=info".into());
    let fmt_layer = if config.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    if cli.command.is_some() {
        debug!("Starting MedAssist v{}", env!("CARGO_PKG_VERSION"));

        if config.enabled_backends().next().is_none() {
            warn!("No generation backends are enabled; every reply will be degraded.");
        }
    }

    cli::run(cli, config).await
}
