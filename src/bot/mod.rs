//! The bot proper: command handlers, replies, the startup channel reset
//! and the chatter sweep.

pub mod commands;
pub mod handlers;
pub mod lifecycle;
pub mod replies;
pub mod sweep;

pub use commands::{command_definitions, help_text, BotCommand, CommandParseError};
pub use handlers::{
    BotSettings, CommandError, CommandInvocation, CommandOutcome, CommandReply, FoodOrderBot,
    IncomingMessage,
};
pub use lifecycle::{HistoryClear, LifecycleReport};
pub use sweep::{spawn_message_sweep, SweepReport};
