use super::commands::BotCommand;
use crate::orders::OrderError;

pub const ORDER_STARTED: &str = "Order started!";
pub const ORDER_UPDATED: &str = "Your order has been updated!";
pub const ORDER_FINALIZED: &str = "Order finalized!";
pub const ORDER_RESTORED: &str = "The previous order has been restored.";
pub const ORDER_REMOVED: &str = "Your order has been removed.";
pub const HELP_SENT: &str = "I've sent you a direct message with the list of commands.";
pub const TRANSPORT_FAILURE: &str =
    "Something went wrong talking to the chat service. Please try again.";

/// What the caller sees when a command is turned down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
    /// Also send the notice as a direct message
    pub notify_directly: bool,
}

impl Rejection {
    fn direct(message: &str) -> Self {
        Self {
            message: message.to_string(),
            notify_directly: true,
        }
    }

    fn quiet(message: &str) -> Self {
        Self {
            message: message.to_string(),
            notify_directly: false,
        }
    }
}

pub fn rejection_for(command: &BotCommand, error: OrderError) -> Rejection {
    match (command, error) {
        (BotCommand::StartOrder { .. }, OrderError::AlreadyActive) => {
            Rejection::direct("An order is already in progress.")
        }
        (BotCommand::AddOrder { .. }, OrderError::NoActiveOrder) => {
            Rejection::direct("No active order. Start an order using /startorder.")
        }
        (BotCommand::EndOrder { .. }, OrderError::NoActiveOrder) => {
            Rejection::direct("No active order to finalize.")
        }
        (BotCommand::RestoreOrder, OrderError::AlreadyActive) => {
            Rejection::quiet("An order is already in progress, cannot restore another order.")
        }
        (BotCommand::RestoreOrder, OrderError::NoBackup) => {
            Rejection::quiet("No order available to restore.")
        }
        (BotCommand::ClearOrder, OrderError::NoActiveOrder) => Rejection::direct("No active order."),
        (BotCommand::ClearOrder, OrderError::MemberHasNoItem) => {
            Rejection::direct("You have no items in the current order.")
        }
        (_, other) => Rejection::quiet(&format!("{other}.")),
    }
}
