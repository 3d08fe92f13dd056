//! Group food orders: the per-channel order state, the channel naming gate and
//! the text rendering of an order.

pub mod gate;
pub mod render;
pub mod store;
pub mod types;

pub use gate::{ChannelGate, MatchMode};
pub use store::{ChannelOrders, OrderStore, RestoredOrder};
pub use types::{Backup, FinalizedOrder, Member, Order, OrderError, OrderId, OrderItem};
