//! CLI module for MedAssist
//!
//! Provides commands:
//! - `chat`: answer one patient message
//! - `health`: probe generation and memory backends
//! - `config`: inspect the resolved configuration

use crate::bootstrap::{self, AppConfig};
use clap::{Parser, Subcommand};
use medassist_core::Language;
use medassist_llm::Capability;
use std::path::PathBuf;

pub mod chat;
pub mod config;
pub mod health;

/// MedAssist medical chat assistant CLI
#[derive(Parser, Debug)]
#[command(name = "medassist")]
#[command(about = "Medical-advice chat assistant")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file, applied after config/local
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one message
    Chat {
        /// Patient message
        #[arg(short, long)]
        message: String,
        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,
        /// Capability to route with (e.g. medical_reasoning)
        #[arg(long)]
        capability: Option<Capability>,
        /// Reply language (es, en)
        #[arg(long)]
        language: Option<Language>,
        /// Print the full reply as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe every backend
    Health,
    /// Inspect configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Run the CLI command
pub async fn run(cli: Cli, app_config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Chat {
            message,
            conversation,
            capability,
            language,
            json,
        }) => {
            let services = bootstrap::build_services(&app_config).await?;
            chat::run(&services, message, conversation, capability, language, json).await
        }
        Some(Commands::Health) => {
            let services = bootstrap::build_services(&app_config).await?;
            health::run(&services).await
        }
        Some(Commands::Config(cmd)) => config::run(&cmd, &app_config),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
