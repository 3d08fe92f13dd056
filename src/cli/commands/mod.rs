pub mod register;
pub mod reset;
pub mod serve;
pub mod show_config;
pub mod simulate;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::bot::{BotSettings, FoodOrderBot};
use crate::config::FoodBotConfig;
use crate::transport::DiscordClient;

/// Build the Discord client and a bot on top of it
pub(crate) fn discord_bot(config: &FoodBotConfig) -> Result<(Arc<DiscordClient>, Arc<FoodOrderBot>)> {
    let client = Arc::new(
        DiscordClient::new(&config.discord).context("Failed to create Discord client")?,
    );
    let bot = Arc::new(FoodOrderBot::new(
        client.clone(),
        BotSettings::from_config(&config.orders),
    ));
    Ok((client, bot))
}

pub(crate) fn print_lifecycle_report(report: &crate::bot::LifecycleReport) {
    println!(
        "🧹 Reset {} channel(s), deleted {} message(s)",
        report.channels_reset.len(),
        report.messages_deleted
    );
    if report.delete_failures > 0 {
        println!("   ⚠️  {} message(s) could not be deleted", report.delete_failures);
    }
    for channel_id in &report.channels_failed {
        println!("   ❌ Could not post a status message in channel {}", channel_id);
    }
}
