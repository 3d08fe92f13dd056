// Food Order Bot Library - group food orders in chat channels
// This exposes the core components for testing and integration

pub mod bot;
pub mod cli;
pub mod config;
pub mod observability;
pub mod orders;
pub mod server;
pub mod shutdown;
pub mod telemetry;
pub mod transport;

// Re-export key types for easy access
pub use bot::{
    BotCommand, BotSettings, CommandError, CommandInvocation, CommandOutcome, CommandReply,
    FoodOrderBot, IncomingMessage, LifecycleReport,
};
pub use config::FoodBotConfig;
pub use observability::{OperationTimer, TransportMetrics};
pub use orders::{ChannelGate, MatchMode, Member, Order, OrderError, OrderStore};
pub use server::{build_router, InteractionResponder, ServerState, SignatureVerifier};
pub use shutdown::shutdown_signal;
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
pub use transport::{
    ChannelInfo, ChatTransport, DiscordClient, InMemoryTransport, TransportError, UserInfo,
};
