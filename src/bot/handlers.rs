//! Command handlers for the food order bot.
//!
//! Every mutating handler follows the same shape: check the channel gate,
//! enter the channel's critical section, apply the change to the order
//! state, then reflect it in the channel while still holding the section.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn, Instrument};

use super::commands::{help_text, BotCommand};
use super::lifecycle::clear_history;
use super::replies::{self, rejection_for};
use crate::config::OrdersConfig;
use crate::orders::render::{render_direct_summary, render_summary};
use crate::orders::{ChannelGate, FinalizedOrder, Member, OrderError, OrderStore};
use crate::telemetry::{create_command_span, generate_correlation_id};
use crate::transport::{ChannelInfo, ChatTransport, MessageId, TransportError, UserId};

/// Who ran a command, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub user: Member,
    pub channel: ChannelInfo,
}

/// A plain message someone posted into a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub channel: ChannelInfo,
    pub author_id: UserId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded,
    Rejected,
    Failed,
}

/// Caller-only response to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
    pub outcome: CommandOutcome,
}

impl CommandReply {
    fn new(content: impl Into<String>, outcome: CommandOutcome) -> Self {
        Self {
            content: content.into(),
            outcome,
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Channel #{channel} is not an order channel")]
    ChannelNotEligible { channel: String },
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("Chat transport failed: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub gate: ChannelGate,
    pub history_limit: usize,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            gate: ChannelGate::default(),
            history_limit: 100,
        }
    }
}

impl BotSettings {
    pub fn from_config(config: &OrdersConfig) -> Self {
        Self {
            gate: ChannelGate::new(&config.channel_prefix, config.match_mode),
            history_limit: config.history_limit,
        }
    }
}

pub struct FoodOrderBot {
    store: OrderStore,
    settings: BotSettings,
    transport: Arc<dyn ChatTransport>,
    bot_user: OnceCell<UserId>,
}

impl FoodOrderBot {
    pub fn new(transport: Arc<dyn ChatTransport>, settings: BotSettings) -> Self {
        Self {
            store: OrderStore::new(),
            settings,
            transport,
            bot_user: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn transport(&self) -> &dyn ChatTransport {
        self.transport.as_ref()
    }

    pub(crate) async fn bot_user_id(&self) -> Result<UserId, TransportError> {
        self.bot_user
            .get_or_try_init(|| async { self.transport.current_user().await.map(|u| u.id) })
            .await
            .copied()
    }

    /// Run a command and turn its result into the caller's reply
    pub async fn dispatch(&self, invocation: &CommandInvocation, command: BotCommand) -> CommandReply {
        let correlation_id = generate_correlation_id();
        let span = create_command_span(
            command.name(),
            invocation.channel.id,
            invocation.user.id,
            &correlation_id,
        );

        async move {
            match self.execute(invocation, &command).await {
                Ok(content) => {
                    info!("Command completed");
                    CommandReply::new(content, CommandOutcome::Succeeded)
                }
                Err(CommandError::ChannelNotEligible { channel }) => {
                    info!(channel = %channel, "Command used outside an order channel");
                    CommandReply::new(
                        self.settings.gate.rejection_message(),
                        CommandOutcome::Rejected,
                    )
                }
                Err(CommandError::Order(e)) => {
                    let rejection = rejection_for(&command, e);
                    info!(reason = %e, "Command rejected");
                    if rejection.notify_directly {
                        self.notify_directly(invocation.user.id, &rejection.message)
                            .await;
                    }
                    CommandReply::new(rejection.message, CommandOutcome::Rejected)
                }
                Err(CommandError::Transport(e)) => {
                    error!(error = %e, "Command failed on the chat transport");
                    CommandReply::new(replies::TRANSPORT_FAILURE, CommandOutcome::Failed)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        invocation: &CommandInvocation,
        command: &BotCommand,
    ) -> Result<String, CommandError> {
        match command {
            BotCommand::StartOrder { place, time } => {
                self.start_order(invocation, place, time).await
            }
            BotCommand::AddOrder { order } => self.add_order(invocation, order).await,
            BotCommand::EndOrder { payout_reference } => {
                self.end_order(invocation, payout_reference.as_deref()).await
            }
            BotCommand::RestoreOrder => self.restore_order(invocation).await,
            BotCommand::ClearOrder => self.clear_order(invocation).await,
            BotCommand::Help => self.help(invocation).await,
        }
    }

    fn ensure_eligible(&self, channel: &ChannelInfo) -> Result<(), CommandError> {
        if self.settings.gate.is_eligible(&channel.name) {
            Ok(())
        } else {
            Err(CommandError::ChannelNotEligible {
                channel: channel.name.clone(),
            })
        }
    }

    async fn notify_directly(&self, user_id: UserId, content: &str) {
        if let Err(e) = self.transport.send_direct(user_id, content).await {
            warn!(user_id, error = %e, "Could not deliver direct notice");
        }
    }

    pub async fn start_order(
        &self,
        invocation: &CommandInvocation,
        place: &str,
        time: &str,
    ) -> Result<String, CommandError> {
        self.ensure_eligible(&invocation.channel)?;
        let channel_id = invocation.channel.id;
        let mut slot = self.store.lock(channel_id).await;

        let order_id = slot.start(invocation.user.clone(), place, time, Utc::now())?;
        info!(%order_id, place = %place, deadline = %time, "Order started");

        clear_history(
            self.transport.as_ref(),
            channel_id,
            self.settings.history_limit,
            slot.status_message(),
        )
        .await;
        slot.upsert_status_message(channel_id, self.transport.as_ref())
            .await?;
        Ok(replies::ORDER_STARTED.to_string())
    }

    pub async fn add_order(
        &self,
        invocation: &CommandInvocation,
        order: &str,
    ) -> Result<String, CommandError> {
        self.ensure_eligible(&invocation.channel)?;
        let channel_id = invocation.channel.id;
        let mut slot = self.store.lock(channel_id).await;

        slot.add_item(invocation.user.clone(), order)?;
        debug!(item = %order, "Item recorded");

        slot.upsert_status_message(channel_id, self.transport.as_ref())
            .await?;
        Ok(replies::ORDER_UPDATED.to_string())
    }

    pub async fn end_order(
        &self,
        invocation: &CommandInvocation,
        payout_reference: Option<&str>,
    ) -> Result<String, CommandError> {
        self.ensure_eligible(&invocation.channel)?;
        let channel_id = invocation.channel.id;
        let mut slot = self.store.lock(channel_id).await;

        // The order stays active until its announcement is posted
        let order = slot.active().cloned().ok_or(OrderError::NoActiveOrder)?;
        let preview = FinalizedOrder {
            order,
            finalized_at: Utc::now(),
        };
        let summary = render_summary(&preview, payout_reference);
        let summary_id = self.transport.send_message(channel_id, &summary).await?;

        let finalized = slot.finalize(preview.finalized_at)?;
        slot.attach_summary_message(summary_id);
        info!(
            order_id = %finalized.order.id,
            items = finalized.order.items().len(),
            "Order finalized"
        );

        self.notify_directly(invocation.user.id, &render_direct_summary(&finalized))
            .await;

        if let Err(e) = slot
            .upsert_status_message(channel_id, self.transport.as_ref())
            .await
        {
            warn!(error = %e, "Order finalized but the status message is stale");
        }
        Ok(replies::ORDER_FINALIZED.to_string())
    }

    pub async fn restore_order(&self, invocation: &CommandInvocation) -> Result<String, CommandError> {
        self.ensure_eligible(&invocation.channel)?;
        let channel_id = invocation.channel.id;
        let mut slot = self.store.lock(channel_id).await;

        let restored = slot.restore()?;
        info!(order_id = %restored.order.id, "Order restored");

        if let Some(summary_id) = restored.summary_message {
            if let Err(e) = self.transport.delete_message(channel_id, summary_id).await {
                warn!(message_id = summary_id, error = %e, "Could not remove the ended-order announcement");
            }
        }

        slot.upsert_status_message(channel_id, self.transport.as_ref())
            .await?;
        Ok(replies::ORDER_RESTORED.to_string())
    }

    pub async fn clear_order(&self, invocation: &CommandInvocation) -> Result<String, CommandError> {
        self.ensure_eligible(&invocation.channel)?;
        let channel_id = invocation.channel.id;
        let mut slot = self.store.lock(channel_id).await;

        let removed = slot.remove_item(invocation.user.id)?;
        debug!(item = %removed.text, "Item removed");

        slot.upsert_status_message(channel_id, self.transport.as_ref())
            .await?;
        Ok(replies::ORDER_REMOVED.to_string())
    }

    pub async fn help(&self, invocation: &CommandInvocation) -> Result<String, CommandError> {
        self.ensure_eligible(&invocation.channel)?;
        self.transport
            .send_direct(invocation.user.id, &help_text())
            .await?;
        Ok(replies::HELP_SENT.to_string())
    }

    /// Keep order channels free of chatter while an order is running.
    ///
    /// Returns whether the message was removed. Delete failures are logged
    /// and reported as `false`.
    pub async fn on_message(&self, message: &IncomingMessage) -> Result<bool, TransportError> {
        if !self.settings.gate.is_eligible(&message.channel.name) {
            return Ok(false);
        }
        if message.author_id == self.bot_user_id().await? {
            return Ok(false);
        }

        let channel_id = message.channel.id;
        let slot = self.store.lock(channel_id).await;
        if slot.active().is_none() {
            return Ok(false);
        }

        match self
            .transport
            .delete_message(channel_id, message.message_id)
            .await
        {
            Ok(()) => {
                debug!(channel_id, message_id = message.message_id, "Removed message posted during an order");
                Ok(true)
            }
            Err(e) => {
                warn!(channel_id, message_id = message.message_id, error = %e, "Could not remove message");
                Ok(false)
            }
        }
    }
}
