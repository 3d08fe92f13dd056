//! Chat transport abstraction
//!
//! The bot only ever talks to the chat platform through [`ChatTransport`], so
//! order handling can be driven by the in-memory transport in tests and local
//! simulation, and by the Discord REST client in production.

pub mod discord;
pub mod errors;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

pub use discord::DiscordClient;
pub use errors::TransportError;
pub use memory::InMemoryTransport;

pub type ChannelId = u64;
pub type UserId = u64;
pub type MessageId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
}

impl ChannelInfo {
    pub fn new(id: ChannelId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
}

/// Capability set the bot needs from a chat platform.
///
/// Every call either completes or fails with a [`TransportError`]; callers
/// decide whether a failure is fatal to the command or only logged.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Identity of the bot account itself
    async fn current_user(&self) -> Result<UserInfo, TransportError>;

    /// All text channels visible to the bot
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, TransportError>;

    /// Look up a single channel
    async fn channel(&self, channel_id: ChannelId) -> Result<ChannelInfo, TransportError>;

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, TransportError>;

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), TransportError>;

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;

    /// Most recent messages first, at most `limit` of them
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageInfo>, TransportError>;

    /// Deliver a direct message to a user
    async fn send_direct(&self, user_id: UserId, content: &str) -> Result<(), TransportError>;
}
