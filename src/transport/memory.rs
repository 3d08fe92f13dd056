//! In-memory chat transport used by tests and `food-order-bot simulate`.
//!
//! Behaves like a tiny chat server: channels hold messages in posting order,
//! direct messages are collected per user, and individual deletes can be made
//! to fail so cleanup paths can be exercised.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use super::{
    ChannelId, ChannelInfo, ChatTransport, MessageId, MessageInfo, TransportError, UserId,
    UserInfo,
};

#[derive(Debug, Default)]
struct Inner {
    channels: Vec<ChannelInfo>,
    messages: HashMap<ChannelId, Vec<MessageInfo>>,
    direct: HashMap<UserId, Vec<String>>,
    failing_deletes: HashSet<MessageId>,
    failing_sends: bool,
    next_message_id: MessageId,
}

#[derive(Debug)]
pub struct InMemoryTransport {
    bot: UserInfo,
    inner: Mutex<Inner>,
}

impl InMemoryTransport {
    pub fn new(bot: UserInfo) -> Self {
        Self {
            bot,
            inner: Mutex::new(Inner {
                next_message_id: 1000,
                ..Default::default()
            }),
        }
    }

    pub async fn add_channel(&self, channel: ChannelInfo) {
        let mut inner = self.inner.lock().await;
        inner.messages.entry(channel.id).or_default();
        inner.channels.push(channel);
    }

    /// Post a message as some other user, as if typed into the channel
    pub async fn post_as(&self, channel_id: ChannelId, author_id: UserId, content: &str) -> MessageId {
        let mut inner = self.inner.lock().await;
        Self::push_message(&mut inner, channel_id, author_id, content)
    }

    /// Channel contents in posting order
    pub async fn messages(&self, channel_id: ChannelId) -> Vec<MessageInfo> {
        let inner = self.inner.lock().await;
        inner.messages.get(&channel_id).cloned().unwrap_or_default()
    }

    pub async fn message(&self, channel_id: ChannelId, message_id: MessageId) -> Option<MessageInfo> {
        let inner = self.inner.lock().await;
        inner
            .messages
            .get(&channel_id)
            .and_then(|msgs| msgs.iter().find(|m| m.id == message_id).cloned())
    }

    pub async fn direct_messages(&self, user_id: UserId) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.direct.get(&user_id).cloned().unwrap_or_default()
    }

    /// Make deleting this message fail with a transport error
    pub async fn fail_delete(&self, message_id: MessageId) {
        self.inner.lock().await.failing_deletes.insert(message_id);
    }

    /// Toggle failure of every channel send and edit
    pub async fn fail_sends(&self, failing: bool) {
        self.inner.lock().await.failing_sends = failing;
    }

    /// Remove a message behind the bot's back
    pub async fn remove_silently(&self, channel_id: ChannelId, message_id: MessageId) {
        let mut inner = self.inner.lock().await;
        if let Some(msgs) = inner.messages.get_mut(&channel_id) {
            msgs.retain(|m| m.id != message_id);
        }
    }

    fn push_message(
        inner: &mut Inner,
        channel_id: ChannelId,
        author_id: UserId,
        content: &str,
    ) -> MessageId {
        inner.next_message_id += 1;
        let id = inner.next_message_id;
        inner
            .messages
            .entry(channel_id)
            .or_default()
            .push(MessageInfo {
                id,
                channel_id,
                author_id,
                content: content.to_string(),
            });
        id
    }

    fn unavailable() -> TransportError {
        TransportError::Http {
            status: 503,
            message: "simulated outage".to_string(),
        }
    }
}

#[async_trait]
impl ChatTransport for InMemoryTransport {
    async fn current_user(&self) -> Result<UserInfo, TransportError> {
        Ok(self.bot.clone())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, TransportError> {
        Ok(self.inner.lock().await.channels.clone())
    }

    async fn channel(&self, channel_id: ChannelId) -> Result<ChannelInfo, TransportError> {
        self.inner
            .lock()
            .await
            .channels
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| TransportError::not_found(format!("channel {channel_id}")))
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, TransportError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_sends {
            return Err(Self::unavailable());
        }
        if !inner.messages.contains_key(&channel_id) {
            return Err(TransportError::not_found(format!("channel {channel_id}")));
        }
        Ok(Self::push_message(&mut inner, channel_id, self.bot.id, content))
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_sends {
            return Err(Self::unavailable());
        }
        let message = inner
            .messages
            .get_mut(&channel_id)
            .and_then(|msgs| msgs.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| TransportError::not_found(format!("message {message_id}")))?;
        message.content = content.to_string();
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_deletes.contains(&message_id) {
            return Err(Self::unavailable());
        }
        let msgs = inner
            .messages
            .get_mut(&channel_id)
            .ok_or_else(|| TransportError::not_found(format!("channel {channel_id}")))?;
        let before = msgs.len();
        msgs.retain(|m| m.id != message_id);
        if msgs.len() == before {
            return Err(TransportError::not_found(format!("message {message_id}")));
        }
        Ok(())
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageInfo>, TransportError> {
        let inner = self.inner.lock().await;
        let msgs = inner
            .messages
            .get(&channel_id)
            .ok_or_else(|| TransportError::not_found(format!("channel {channel_id}")))?;
        Ok(msgs.iter().rev().take(limit).cloned().collect())
    }

    async fn send_direct(&self, user_id: UserId, content: &str) -> Result<(), TransportError> {
        self.inner
            .lock()
            .await
            .direct
            .entry(user_id)
            .or_default()
            .push(content.to_string());
        Ok(())
    }
}
