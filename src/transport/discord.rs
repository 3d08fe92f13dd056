use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{
    ChannelId, ChannelInfo, ChatTransport, MessageId, MessageInfo, TransportError, UserId,
    UserInfo,
};
use crate::config::DiscordConfig;
use crate::observability::TransportMetrics;

/// Discord's channel type for guild text channels
const GUILD_TEXT: u8 = 0;
/// Discord caps message history pages at 100
const MAX_HISTORY_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiGuild {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: String,
    channel_id: String,
    author: ApiUser,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiRateLimit {
    retry_after: f64,
}

pub(crate) fn parse_snowflake(raw: &str) -> Result<u64, TransportError> {
    raw.parse::<u64>().map_err(|_| TransportError::Decode {
        message: format!("invalid snowflake id '{raw}'"),
    })
}

impl ApiUser {
    fn into_user_info(self) -> Result<UserInfo, TransportError> {
        Ok(UserInfo {
            id: parse_snowflake(&self.id)?,
            name: self.global_name.unwrap_or(self.username),
        })
    }
}

/// Discord REST client with client-side rate limiting and lookup caches
#[derive(Debug)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    application_id: Option<u64>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    channel_cache: Cache<ChannelId, ChannelInfo>,
    dm_channels: Cache<UserId, ChannelId>,
    metrics: Arc<TransportMetrics>,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> Result<Self, TransportError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TransportError::NotConfigured {
                what: "Discord bot token (DISCORD_BOT_TOKEN)".to_string(),
            })?;

        let per_second =
            NonZeroU32::new(config.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        let http = reqwest::Client::builder()
            .user_agent(concat!(
                "DiscordBot (food-order-bot, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .timeout(Duration::from_secs(15))
            .build()?;

        // Channel names rarely change; DM channels never do
        let channel_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300))
            .build();
        let dm_channels = Cache::builder().max_capacity(1000).build();

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            application_id: config.application_id,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            channel_cache,
            dm_channels,
            metrics: Arc::new(TransportMetrics::new()),
        })
    }

    pub fn metrics(&self) -> Arc<TransportMetrics> {
        self.metrics.clone()
    }

    fn application_id(&self) -> Result<u64, TransportError> {
        self.application_id
            .ok_or_else(|| TransportError::NotConfigured {
                what: "Discord application id".to_string(),
            })
    }

    /// Execute a request with rate limiting and status mapping
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, TransportError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
        self.metrics.record_request();

        let url = format!("{}{}", self.api_base, path);
        debug!(method = %method, path = %path, "Executing Discord API request");

        let mut request = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            self.metrics.record_error();
            TransportError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        self.metrics.record_error();
        match status {
            StatusCode::NOT_FOUND => Err(TransportError::not_found(path.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                self.metrics.record_rate_limit_hit();
                let retry_after_ms = response
                    .json::<ApiRateLimit>()
                    .await
                    .map(|r| (r.retry_after * 1000.0) as u64)
                    .unwrap_or(1000);
                Err(TransportError::RateLimited { retry_after_ms })
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(TransportError::Http {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, TransportError> {
        let response = self.execute(method, path, body).await?;
        response.json::<T>().await.map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })
    }

    async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), TransportError> {
        self.execute(method, path, body).await?;
        Ok(())
    }

    async fn dm_channel(&self, user_id: UserId) -> Result<ChannelId, TransportError> {
        if let Some(channel_id) = self.dm_channels.get(&user_id).await {
            self.metrics.record_cache_hit();
            return Ok(channel_id);
        }
        self.metrics.record_cache_miss();

        let channel: ApiChannel = self
            .request_json(
                Method::POST,
                "/users/@me/channels",
                Some(json!({ "recipient_id": user_id.to_string() })),
            )
            .await?;
        let channel_id = parse_snowflake(&channel.id)?;
        self.dm_channels.insert(user_id, channel_id).await;
        Ok(channel_id)
    }

    /// Complete a deferred interaction response
    pub async fn edit_original_response(
        &self,
        interaction_token: &str,
        content: &str,
    ) -> Result<(), TransportError> {
        let application_id = self.application_id()?;
        self.request_empty(
            Method::PATCH,
            &format!("/webhooks/{application_id}/{interaction_token}/messages/@original"),
            Some(json!({ "content": content })),
        )
        .await
    }

    /// Replace the application's global slash commands
    pub async fn register_commands(&self, commands: &Value) -> Result<usize, TransportError> {
        let application_id = self.application_id()?;
        let registered: Vec<Value> = self
            .request_json(
                Method::PUT,
                &format!("/applications/{application_id}/commands"),
                Some(commands.clone()),
            )
            .await?;
        info!(count = registered.len(), "Registered slash commands");
        Ok(registered.len())
    }
}

#[async_trait]
impl ChatTransport for DiscordClient {
    async fn current_user(&self) -> Result<UserInfo, TransportError> {
        let user: ApiUser = self.request_json(Method::GET, "/users/@me", None).await?;
        user.into_user_info()
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, TransportError> {
        let guilds: Vec<ApiGuild> = self
            .request_json(Method::GET, "/users/@me/guilds", None)
            .await?;

        let mut channels = Vec::new();
        for guild in guilds {
            let guild_channels: Vec<ApiChannel> = self
                .request_json(Method::GET, &format!("/guilds/{}/channels", guild.id), None)
                .await?;
            for channel in guild_channels {
                if channel.kind != GUILD_TEXT {
                    continue;
                }
                let Some(name) = channel.name else { continue };
                let info = ChannelInfo {
                    id: parse_snowflake(&channel.id)?,
                    name,
                };
                self.channel_cache.insert(info.id, info.clone()).await;
                channels.push(info);
            }
        }
        debug!(count = channels.len(), "Listed text channels");
        Ok(channels)
    }

    async fn channel(&self, channel_id: ChannelId) -> Result<ChannelInfo, TransportError> {
        if let Some(info) = self.channel_cache.get(&channel_id).await {
            self.metrics.record_cache_hit();
            return Ok(info);
        }
        self.metrics.record_cache_miss();

        let channel: ApiChannel = self
            .request_json(Method::GET, &format!("/channels/{channel_id}"), None)
            .await?;
        let info = ChannelInfo {
            id: parse_snowflake(&channel.id)?,
            name: channel.name.unwrap_or_default(),
        };
        self.channel_cache.insert(channel_id, info.clone()).await;
        Ok(info)
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, TransportError> {
        let message: ApiMessage = self
            .request_json(
                Method::POST,
                &format!("/channels/{channel_id}/messages"),
                Some(json!({ "content": content })),
            )
            .await?;
        parse_snowflake(&message.id)
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), TransportError> {
        self.request_empty(
            Method::PATCH,
            &format!("/channels/{channel_id}/messages/{message_id}"),
            Some(json!({ "content": content })),
        )
        .await
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.request_empty(
            Method::DELETE,
            &format!("/channels/{channel_id}/messages/{message_id}"),
            None,
        )
        .await
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageInfo>, TransportError> {
        let limit = limit.clamp(1, MAX_HISTORY_PAGE);
        let messages: Vec<ApiMessage> = self
            .request_json(
                Method::GET,
                &format!("/channels/{channel_id}/messages?limit={limit}"),
                None,
            )
            .await?;

        messages
            .into_iter()
            .map(|m| {
                Ok(MessageInfo {
                    id: parse_snowflake(&m.id)?,
                    channel_id: parse_snowflake(&m.channel_id)?,
                    author_id: parse_snowflake(&m.author.id)?,
                    content: m.content,
                })
            })
            .collect()
    }

    async fn send_direct(&self, user_id: UserId, content: &str) -> Result<(), TransportError> {
        let channel_id = self.dm_channel(user_id).await?;
        self.send_message(channel_id, content).await?;
        Ok(())
    }
}
