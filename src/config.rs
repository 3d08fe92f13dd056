use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::orders::MatchMode;

/// Main configuration structure for the food order bot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodBotConfig {
    /// Discord connection settings
    pub discord: DiscordConfig,
    /// Order channel settings
    pub orders: OrdersConfig,
    /// Interaction endpoint settings
    pub server: ServerConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    /// Bot token (can be set via DISCORD_BOT_TOKEN)
    pub token: Option<String>,
    /// Application id, needed for command registration and interaction follow-ups
    pub application_id: Option<u64>,
    /// Hex-encoded Ed25519 public key used to verify interaction requests
    pub public_key: Option<String>,
    /// REST API base URL
    pub api_base: String,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
    /// Channel name convention for order channels
    pub channel_prefix: String,
    /// Whether channel names must start with or exactly equal the convention
    pub match_mode: MatchMode,
    /// How many recent messages a channel clear looks at
    pub history_limit: usize,
    /// Seconds between chatter sweeps of active order channels (0 disables)
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address the interaction endpoint listens on
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON structured logs instead of human readable lines
    pub json_logs: bool,
}

impl Default for FoodBotConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig {
                token: None, // Read from env var or config file
                application_id: None,
                public_key: None,
                api_base: "https://discord.com/api/v10".to_string(),
                rate_limit: RateLimitConfig {
                    requests_per_second: 5,
                    burst_capacity: 10,
                },
            },
            orders: OrdersConfig {
                channel_prefix: "food-order".to_string(),
                match_mode: MatchMode::Prefix,
                history_limit: 100,
                sweep_interval_secs: 5,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl FoodBotConfig {
    /// Load configuration from the standard locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (food-order-bot.toml, .food-order-bot-rc, or an explicit path)
    /// 3. Environment variables (prefixed with FOOD_ORDER_BOT, `__` between sections)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&FoodBotConfig::default())
                .context("Failed to build default configuration")?,
        );

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new("food-order-bot.toml").exists() {
                    builder = builder.add_source(File::with_name("food-order-bot"));
                }
                if Path::new(".food-order-bot-rc").exists() {
                    builder = builder.add_source(
                        File::with_name(".food-order-bot-rc").format(config::FileFormat::Toml),
                    );
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FOOD_ORDER_BOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration")?;
        let mut bot_config: FoodBotConfig = config
            .try_deserialize()
            .context("Configuration has an unexpected shape")?;

        // Fall back to the conventional token variable
        if bot_config.discord.token.is_none() {
            if let Ok(token) = std::env::var("DISCORD_BOT_TOKEN") {
                bot_config.discord.token = Some(token);
            }
        }

        Ok(bot_config)
    }

    /// Save configuration to file, leaving out the bot token
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut saved = self.clone();
        saved.discord.token = None;
        let toml_content = toml::to_string_pretty(&saved)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Render as TOML with the token hidden
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.discord.token.is_some() {
            redacted.discord.token = Some("<redacted>".to_string());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
