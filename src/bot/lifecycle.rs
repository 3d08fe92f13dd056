//! Startup reset of order channels.

use tracing::{error, info, warn};

use super::handlers::FoodOrderBot;
use crate::observability::OperationTimer;
use crate::transport::{ChannelId, ChatTransport, MessageId, TransportError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HistoryClear {
    pub deleted: usize,
    pub failed: usize,
}

/// Delete recent channel messages except `keep`.
///
/// Best effort: a message that cannot be deleted (already gone, missing
/// permission) is logged and skipped.
pub(crate) async fn clear_history(
    transport: &dyn ChatTransport,
    channel_id: ChannelId,
    limit: usize,
    keep: Option<MessageId>,
) -> HistoryClear {
    let mut outcome = HistoryClear::default();
    let messages = match transport.recent_messages(channel_id, limit).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!(channel_id, error = %e, "Could not read channel history");
            return outcome;
        }
    };

    for message in messages.iter().filter(|m| Some(m.id) != keep) {
        match transport.delete_message(channel_id, message.id).await {
            Ok(()) => outcome.deleted += 1,
            Err(e) => {
                outcome.failed += 1;
                warn!(channel_id, message_id = message.id, error = %e, "Could not delete message");
            }
        }
    }
    outcome
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LifecycleReport {
    pub channels_reset: Vec<ChannelId>,
    pub channels_failed: Vec<ChannelId>,
    pub messages_deleted: usize,
    pub delete_failures: usize,
}

impl FoodOrderBot {
    /// Bring every order channel to a clean slate: history cleared and a
    /// fresh status message posted.
    pub async fn reset_channels(&self) -> Result<LifecycleReport, TransportError> {
        let timer = OperationTimer::new("reset_channels");
        let gate = &self.settings().gate;
        let mut report = LifecycleReport::default();

        let channels = self.transport().list_channels().await?;
        let eligible: Vec<_> = channels
            .into_iter()
            .filter(|c| gate.is_eligible(&c.name))
            .collect();
        if eligible.is_empty() {
            warn!(convention = %gate.convention(), "No order channels found");
        }

        for channel in eligible {
            let mut slot = self.store().lock(channel.id).await;
            slot.reset();

            let cleared = clear_history(
                self.transport(),
                channel.id,
                self.settings().history_limit,
                None,
            )
            .await;
            report.messages_deleted += cleared.deleted;
            report.delete_failures += cleared.failed;

            match slot.upsert_status_message(channel.id, self.transport()).await {
                Ok(_) => {
                    info!(channel = %channel.name, deleted = cleared.deleted, "Order channel reset");
                    report.channels_reset.push(channel.id);
                }
                Err(e) => {
                    error!(channel = %channel.name, error = %e, "Could not post status message");
                    report.channels_failed.push(channel.id);
                }
            }
        }

        timer.finish();
        Ok(report)
    }
}
