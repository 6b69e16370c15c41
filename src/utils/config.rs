// Centralized configuration for O Mago

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// How long a newcomer has to answer the welcome prompt
pub const ONBOARDING_TIMEOUT: Duration = Duration::from_secs(300);

/// Prefix of every per-player private channel
pub const PRIVATE_CHANNEL_PREFIX: &str = "diario-";

/// Discord rejects channel names longer than this
pub const MAX_CHANNEL_NAME_LEN: usize = 100;

/// Discord rejects embed field values longer than this
pub const MAX_EMBED_FIELD_LEN: usize = 1024;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_KEEP_ALIVE_PORT: u16 = 8080;
pub const DEFAULT_PREFIX: &str = "!";

/// Discord embed colors
pub mod colors {
    pub const PURPLE: u32 = 0x9b59b6;
    pub const DARK_RED: u32 = 0x992d22;
    pub const INFO: u32 = 0x3498db;
}

/// Process settings read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub config_file: PathBuf,
    pub keep_alive_port: u16,
    pub command_prefix: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let config_file = lookup("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let keep_alive_port = match lookup("KEEP_ALIVE_PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| anyhow!("Invalid KEEP_ALIVE_PORT `{}`: {}", port, e))?,
            None => DEFAULT_KEEP_ALIVE_PORT,
        };

        let command_prefix = lookup("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        Ok(Self {
            discord_token,
            config_file,
            keep_alive_port,
            command_prefix,
        })
    }
}
