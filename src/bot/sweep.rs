//! Periodic removal of chatter from channels with a running order.
//!
//! Slash commands reach the bot over HTTP, plain messages do not, so while
//! serving the bot polls the recent history of every channel with an active
//! order and feeds each message through [`FoodOrderBot::on_message`].

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::handlers::{FoodOrderBot, IncomingMessage};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub channels_swept: usize,
    pub messages_removed: usize,
}

impl FoodOrderBot {
    /// Run every recent message of each active order channel through the
    /// incoming-message handler. Transport failures skip the channel.
    pub async fn sweep_active_channels(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for channel_id in self.store().active_channels().await {
            let channel = match self.transport().channel(channel_id).await {
                Ok(channel) => channel,
                Err(e) => {
                    warn!(channel_id, error = %e, "Could not look up order channel");
                    continue;
                }
            };
            let messages = match self
                .transport()
                .recent_messages(channel_id, self.settings().history_limit)
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(channel_id, error = %e, "Could not read order channel history");
                    continue;
                }
            };

            report.channels_swept += 1;
            for message in messages {
                let incoming = IncomingMessage {
                    channel: channel.clone(),
                    author_id: message.author_id,
                    message_id: message.id,
                };
                match self.on_message(&incoming).await {
                    Ok(true) => report.messages_removed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(channel_id, error = %e, "Could not check message author");
                        break;
                    }
                }
            }
        }

        if report.messages_removed > 0 {
            debug!(
                channels = report.channels_swept,
                removed = report.messages_removed,
                "Swept order channels"
            );
        }
        report
    }
}

/// Spawn a background task that sweeps active order channels every `interval`
pub fn spawn_message_sweep(bot: Arc<FoodOrderBot>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            bot.sweep_active_channels().await;
        }
    })
}
