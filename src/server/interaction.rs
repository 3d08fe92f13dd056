//! The subset of Discord's interaction payload the bot reads.

use serde::Deserialize;
use serde_json::Value;

use crate::orders::Member;
use crate::transport::discord::parse_snowflake;
use crate::transport::{ChannelId, ChannelInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    Other(u8),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionMember {
    pub user: InteractionUser,
    #[serde(default)]
    pub nick: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartialChannel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    /// Option values as strings; the bot only declares string options
    pub fn string_options(&self) -> Vec<(String, String)> {
        self.options
            .iter()
            .map(|opt| {
                let value = match &opt.value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (opt.name.clone(), value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel: Option<PartialChannel>,
    /// Present for invocations inside a server
    #[serde(default)]
    pub member: Option<InteractionMember>,
    /// Present for invocations in direct messages
    #[serde(default)]
    pub user: Option<InteractionUser>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        match self.kind {
            1 => InteractionKind::Ping,
            2 => InteractionKind::ApplicationCommand,
            other => InteractionKind::Other(other),
        }
    }

    pub fn invoking_member(&self) -> Option<Member> {
        let (user, nick) = match (&self.member, &self.user) {
            (Some(member), _) => (&member.user, member.nick.clone()),
            (None, Some(user)) => (user, None),
            (None, None) => return None,
        };
        let id = parse_snowflake(&user.id).ok()?;
        let name = nick
            .or_else(|| user.global_name.clone())
            .unwrap_or_else(|| user.username.clone());
        Some(Member { id, name })
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel
            .as_ref()
            .map(|c| c.id.as_str())
            .or(self.channel_id.as_deref())
            .and_then(|id| parse_snowflake(id).ok())
    }

    /// Channel identity when the payload carries the channel name
    pub fn channel_info(&self) -> Option<ChannelInfo> {
        let channel = self.channel.as_ref()?;
        let name = channel.name.clone()?;
        Some(ChannelInfo {
            id: parse_snowflake(&channel.id).ok()?,
            name,
        })
    }
}
