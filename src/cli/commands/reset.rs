use anyhow::{Context, Result};

use super::{discord_bot, print_lifecycle_report};
use crate::config::FoodBotConfig;

pub struct ResetChannelsCommand {
    config: FoodBotConfig,
}

impl ResetChannelsCommand {
    pub fn new(config: FoodBotConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<()> {
        println!(
            "🔄 Resetting channels matching #{}",
            self.config.orders.channel_prefix
        );
        let (client, bot) = discord_bot(&self.config)?;
        let report = bot
            .reset_channels()
            .await
            .context("Failed to list channels")?;
        print_lifecycle_report(&report);
        client.metrics().log_stats();
        Ok(())
    }
}
