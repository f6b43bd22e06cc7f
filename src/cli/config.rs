//! CLI configuration inspection
//!
//! Provides `medassist config {show,get}` for viewing the resolved settings.

use crate::bootstrap::AppConfig;
use anyhow::{bail, Context, Result};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the resolved configuration as TOML
    Show,
    /// Print one setting (dot notation: gateway.retry.max_attempts)
    Get {
        /// Setting key
        key: String,
    },
}

pub fn run(cmd: &ConfigCommands, config: &AppConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{text}");
        }
        ConfigCommands::Get { key } => {
            let value = lookup(config, key)?;
            match value {
                serde_json::Value::String(s) => println!("{s}"),
                serde_json::Value::Bool(b) => println!("{b}"),
                serde_json::Value::Number(n) => println!("{n}"),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
        }
    }
    Ok(())
}

/// Navigate a dot-notation path through the serialized config
pub fn lookup(config: &AppConfig, key: &str) -> Result<serde_json::Value> {
    let json = serde_json::to_value(config).context("Failed to serialize config")?;
    let mut current = &json;
    for part in key.split('.') {
        let next = match current {
            serde_json::Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            other => other.get(part),
        };
        match next {
            Some(v) => current = v,
            None => bail!("Key not found: {key}"),
        }
    }
    Ok(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_nested_and_indexed() {
        let config: AppConfig = toml::from_str(crate::bootstrap::loader::DEFAULT_CONFIG).unwrap();
        assert_eq!(lookup(&config, "gateway.retry.max_attempts").unwrap(), 3);
        assert_eq!(lookup(&config, "backends.2.id").unwrap(), "groq");
        assert!(lookup(&config, "gateway.nope").is_err());
    }
}
