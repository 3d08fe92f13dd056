//! Local conversation replay against the in-memory transport.
//!
//! Script lines look like `alice: /startorder "Pizza Place" 19:00` for a
//! command or `bob: anyone want fries?` for a plain message. Blank lines and
//! lines starting with `#` are skipped.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bot::{BotCommand, BotSettings, CommandInvocation, FoodOrderBot, IncomingMessage};
use crate::config::FoodBotConfig;
use crate::orders::Member;
use crate::transport::{ChannelInfo, InMemoryTransport, UserId, UserInfo};

const BOT_USER_ID: UserId = 1;
const CHANNEL_ID: u64 = 10;
const FIRST_MEMBER_ID: UserId = 100;

pub struct SimulateCommand {
    config: FoodBotConfig,
    channel: Option<String>,
}

impl SimulateCommand {
    pub fn new(config: FoodBotConfig) -> Self {
        Self {
            config,
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let channel_name = self
            .channel
            .clone()
            .unwrap_or_else(|| self.config.orders.channel_prefix.clone());
        let mut simulation =
            Simulation::new(BotSettings::from_config(&self.config.orders), &channel_name).await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            for output in simulation.run_line(&line).await? {
                println!("{}", output);
            }
        }

        println!();
        println!("--- #{} ---", channel_name);
        for message in simulation.channel_contents().await {
            println!("{}", message);
            println!("---");
        }
        Ok(())
    }
}

/// A bot wired to one in-memory channel, fed one script line at a time
pub struct Simulation {
    transport: Arc<InMemoryTransport>,
    bot: FoodOrderBot,
    channel: ChannelInfo,
    members: HashMap<String, UserId>,
    seen_direct: HashMap<UserId, usize>,
}

impl Simulation {
    pub async fn new(settings: BotSettings, channel_name: &str) -> Result<Self> {
        let transport = Arc::new(InMemoryTransport::new(UserInfo {
            id: BOT_USER_ID,
            name: "food-order-bot".to_string(),
        }));
        let channel = ChannelInfo::new(CHANNEL_ID, channel_name);
        transport.add_channel(channel.clone()).await;

        let bot = FoodOrderBot::new(transport.clone(), settings);
        bot.reset_channels()
            .await
            .context("Failed to prepare the simulated channel")?;

        Ok(Self {
            transport,
            bot,
            channel,
            members: HashMap::new(),
            seen_direct: HashMap::new(),
        })
    }

    /// Run one script line and return what should be shown for it
    pub async fn run_line(&mut self, line: &str) -> Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Vec::new());
        }
        let Some((user, rest)) = line.split_once(':') else {
            bail!("Expected '<user>: <input>', got '{}'", line);
        };
        let user = user.trim();
        let rest = rest.trim();
        if user.is_empty() {
            bail!("Missing user name in '{}'", line);
        }
        let member = self.member(user);

        let mut output = Vec::new();
        match rest.strip_prefix('/') {
            Some(command_line) => {
                let tokens = tokenize(command_line)?;
                let Some((name, args)) = tokens.split_first() else {
                    bail!("Missing command name in '{}'", line);
                };
                match BotCommand::from_args(name, args) {
                    Ok(command) => {
                        let invocation = CommandInvocation {
                            user: member.clone(),
                            channel: self.channel.clone(),
                        };
                        let reply = self.bot.dispatch(&invocation, command).await;
                        output.push(format!("[to {}] {}", member.name, reply.content));
                    }
                    Err(e) => output.push(format!("[to {}] {}", member.name, e)),
                }
            }
            None => {
                let message_id = self
                    .transport
                    .post_as(self.channel.id, member.id, rest)
                    .await;
                let incoming = IncomingMessage {
                    channel: self.channel.clone(),
                    author_id: member.id,
                    message_id,
                };
                if self.bot.on_message(&incoming).await? {
                    output.push(format!("[removed message from {}]", member.name));
                }
            }
        }

        output.extend(self.new_direct_messages().await);
        Ok(output)
    }

    /// Current channel messages in posting order
    pub async fn channel_contents(&self) -> Vec<String> {
        self.transport
            .messages(self.channel.id)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    fn member(&mut self, name: &str) -> Member {
        let next_id = FIRST_MEMBER_ID + self.members.len() as UserId;
        let id = *self.members.entry(name.to_string()).or_insert(next_id);
        Member::new(id, name)
    }

    async fn new_direct_messages(&mut self) -> Vec<String> {
        let mut output = Vec::new();
        let mut members: Vec<_> = self.members.iter().map(|(n, id)| (n.clone(), *id)).collect();
        members.sort_by_key(|(_, id)| *id);
        for (name, id) in members {
            let messages = self.transport.direct_messages(id).await;
            let seen = self.seen_direct.entry(id).or_insert(0);
            for message in &messages[*seen..] {
                output.push(format!("[dm to {}] {}", name, message));
            }
            *seen = messages.len();
        }
        output
    }
}

/// Split on whitespace, keeping double-quoted runs together
pub(crate) fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        bail!("Unterminated quote in '{}'", input);
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}
