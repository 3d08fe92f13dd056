use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::transport::{MessageId, UserId};

pub type OrderId = Uuid;

/// A channel member as the bot knows them: stable id plus display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub name: String,
}

impl Member {
    pub fn new(id: UserId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub member: Member,
    pub text: String,
}

/// The active food order of one channel.
///
/// Everything except the item list is fixed at creation. Items are kept in
/// the order members first added them; a member re-adding replaces their
/// entry without moving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub starter: Member,
    pub place: String,
    pub deadline: String,
    pub started_at: DateTime<Utc>,
    items: Vec<OrderItem>,
}

impl Order {
    pub(crate) fn new(starter: Member, place: &str, deadline: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            starter,
            place: place.to_string(),
            deadline: deadline.to_string(),
            started_at,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_for(&self, member_id: UserId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.member.id == member_id)
    }

    pub(crate) fn upsert_item(&mut self, member: Member, text: &str) {
        match self.items.iter_mut().find(|item| item.member.id == member.id) {
            Some(existing) => {
                existing.member = member;
                existing.text = text.to_string();
            }
            None => self.items.push(OrderItem {
                member,
                text: text.to_string(),
            }),
        }
    }

    pub(crate) fn remove_item(&mut self, member_id: UserId) -> Option<OrderItem> {
        let index = self.items.iter().position(|item| item.member.id == member_id)?;
        Some(self.items.remove(index))
    }
}

/// Snapshot handed back when an order is ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedOrder {
    pub order: Order,
    pub finalized_at: DateTime<Utc>,
}

/// The most recently ended order of a channel, kept for one undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub order: Order,
    pub finalized_at: DateTime<Utc>,
    /// The "order ended" announcement posted for this order, if any
    pub summary_message: Option<MessageId>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    #[error("An order is already in progress")]
    AlreadyActive,
    #[error("No active order")]
    NoActiveOrder,
    #[error("No order available to restore")]
    NoBackup,
    #[error("Member has no item in the current order")]
    MemberHasNoItem,
}
