//! Per-channel order state.
//!
//! Each channel gets its own [`ChannelOrders`] slot behind a
//! `tokio::sync::Mutex`. Command handlers hold the slot guard from reading the
//! current order until the status message reflects their change, so two
//! commands for the same channel never interleave while other channels carry
//! on independently.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::render::render;
use super::types::{Backup, FinalizedOrder, Member, Order, OrderError, OrderId, OrderItem};
use crate::transport::{ChannelId, ChatTransport, MessageId, TransportError, UserId};

/// Result of promoting a backup back to the active order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredOrder {
    pub order: Order,
    /// Announcement of the earlier finalize, now stale
    pub summary_message: Option<MessageId>,
}

#[derive(Debug, Default)]
pub struct ChannelOrders {
    active: Option<Order>,
    backup: Option<Backup>,
    status_message: Option<MessageId>,
}

impl ChannelOrders {
    pub fn active(&self) -> Option<&Order> {
        self.active.as_ref()
    }

    pub fn backup(&self) -> Option<&Backup> {
        self.backup.as_ref()
    }

    pub fn status_message(&self) -> Option<MessageId> {
        self.status_message
    }

    pub fn start(
        &mut self,
        starter: Member,
        place: &str,
        deadline: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderId, OrderError> {
        if self.active.is_some() {
            return Err(OrderError::AlreadyActive);
        }
        let order = Order::new(starter, place, deadline, now);
        let id = order.id;
        self.active = Some(order);
        Ok(id)
    }

    /// Set the member's item, replacing any earlier one
    pub fn add_item(&mut self, member: Member, text: &str) -> Result<(), OrderError> {
        let order = self.active.as_mut().ok_or(OrderError::NoActiveOrder)?;
        order.upsert_item(member, text);
        Ok(())
    }

    pub fn remove_item(&mut self, member_id: UserId) -> Result<OrderItem, OrderError> {
        let order = self.active.as_mut().ok_or(OrderError::NoActiveOrder)?;
        order
            .remove_item(member_id)
            .ok_or(OrderError::MemberHasNoItem)
    }

    /// Move the active order into the backup slot, replacing any older backup
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<FinalizedOrder, OrderError> {
        let order = self.active.take().ok_or(OrderError::NoActiveOrder)?;
        self.backup = Some(Backup {
            order: order.clone(),
            finalized_at: now,
            summary_message: None,
        });
        Ok(FinalizedOrder {
            order,
            finalized_at: now,
        })
    }

    /// Remember the announcement posted for the backed-up order
    pub fn attach_summary_message(&mut self, message_id: MessageId) {
        if let Some(backup) = self.backup.as_mut() {
            backup.summary_message = Some(message_id);
        }
    }

    pub fn restore(&mut self) -> Result<RestoredOrder, OrderError> {
        if self.active.is_some() {
            return Err(OrderError::AlreadyActive);
        }
        let backup = self.backup.take().ok_or(OrderError::NoBackup)?;
        self.active = Some(backup.order.clone());
        Ok(RestoredOrder {
            order: backup.order,
            summary_message: backup.summary_message,
        })
    }

    /// Forget everything about the channel, including the status message
    pub fn reset(&mut self) {
        self.active = None;
        self.backup = None;
        self.status_message = None;
    }

    /// Bring the channel's status message in line with the current order.
    ///
    /// Edits the known message in place; posts a new one when none is known
    /// or the known one has disappeared. Any other failure is returned and
    /// the stored reference is kept so the next command edits it again.
    pub async fn upsert_status_message(
        &mut self,
        channel_id: ChannelId,
        transport: &dyn ChatTransport,
    ) -> Result<MessageId, TransportError> {
        let content = render(self.active.as_ref());

        if let Some(message_id) = self.status_message {
            match transport.edit_message(channel_id, message_id, &content).await {
                Ok(()) => {
                    debug!(channel_id, message_id, "Status message updated");
                    return Ok(message_id);
                }
                Err(e) if e.is_not_found() => {
                    warn!(channel_id, message_id, "Status message is gone, posting a new one");
                    self.status_message = None;
                }
                Err(e) => return Err(e),
            }
        }

        let message_id = transport.send_message(channel_id, &content).await?;
        self.status_message = Some(message_id);
        info!(channel_id, message_id, "Status message posted");
        Ok(message_id)
    }
}

/// Owner of every channel's order slot
#[derive(Debug, Default)]
pub struct OrderStore {
    channels: Mutex<HashMap<ChannelId, Arc<Mutex<ChannelOrders>>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, channel_id: ChannelId) -> Arc<Mutex<ChannelOrders>> {
        let mut channels = self.channels.lock().await;
        channels.entry(channel_id).or_default().clone()
    }

    /// Enter the channel's critical section
    pub async fn lock(&self, channel_id: ChannelId) -> OwnedMutexGuard<ChannelOrders> {
        self.slot(channel_id).await.lock_owned().await
    }

    pub async fn start(
        &self,
        channel_id: ChannelId,
        starter: Member,
        place: &str,
        deadline: &str,
    ) -> Result<OrderId, OrderError> {
        self.lock(channel_id)
            .await
            .start(starter, place, deadline, Utc::now())
    }

    pub async fn add_item(
        &self,
        channel_id: ChannelId,
        member: Member,
        text: &str,
    ) -> Result<(), OrderError> {
        self.lock(channel_id).await.add_item(member, text)
    }

    pub async fn remove_item(
        &self,
        channel_id: ChannelId,
        member_id: UserId,
    ) -> Result<OrderItem, OrderError> {
        self.lock(channel_id).await.remove_item(member_id)
    }

    pub async fn finalize(&self, channel_id: ChannelId) -> Result<FinalizedOrder, OrderError> {
        self.lock(channel_id).await.finalize(Utc::now())
    }

    pub async fn restore(&self, channel_id: ChannelId) -> Result<RestoredOrder, OrderError> {
        self.lock(channel_id).await.restore()
    }

    pub async fn active_order(&self, channel_id: ChannelId) -> Option<Order> {
        self.lock(channel_id).await.active().cloned()
    }

    pub async fn backup(&self, channel_id: ChannelId) -> Option<Backup> {
        self.lock(channel_id).await.backup().cloned()
    }

    pub async fn status_message(&self, channel_id: ChannelId) -> Option<MessageId> {
        self.lock(channel_id).await.status_message()
    }

    /// Number of channels with an order in progress.
    ///
    /// Never waits on a channel: slots held by a running command are skipped.
    pub async fn active_order_count(&self) -> usize {
        let slots: Vec<_> = self.channels.lock().await.values().cloned().collect();
        slots
            .iter()
            .filter(|slot| matches!(slot.try_lock(), Ok(orders) if orders.active().is_some()))
            .count()
    }

    /// Channels that currently have an order in progress
    pub async fn active_channels(&self) -> Vec<ChannelId> {
        let slots: Vec<_> = self
            .channels
            .lock()
            .await
            .iter()
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();
        let mut active = Vec::new();
        for (channel_id, slot) in slots {
            if slot.lock().await.active().is_some() {
                active.push(channel_id);
            }
        }
        active.sort_unstable();
        active
    }
}
