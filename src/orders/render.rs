//! Text shown to people: the standing status message, the channel
//! announcement posted when an order ends, and the finalizer's copy.

use super::types::{FinalizedOrder, Order, OrderItem};

pub const NO_ACTIVE_ORDER: &str = "No active order.";
pub const NO_ITEMS_YET: &str = "No orders yet.";
pub const ADD_ITEM_HINT: &str = "Use \"/addorder [order]\" to order your food.";
const NO_ITEMS_PLACED: &str = "No orders were placed.";

fn item_lines(items: &[OrderItem], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| format!("{}: {}", item.member.name, item.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status message for a channel
pub fn render(order: Option<&Order>) -> String {
    let Some(order) = order else {
        return NO_ACTIVE_ORDER.to_string();
    };

    format!(
        "Order in progress by {starter}\n\n\
         From: {place}\n\
         Order before: {deadline}\n\
         Started at: {started}\n\n\
         Current orders:\n\
         {items}\n\n\
         {hint}",
        starter = order.starter.name,
        place = order.place,
        deadline = order.deadline,
        started = order.started_at.format("%H:%M UTC"),
        items = item_lines(order.items(), NO_ITEMS_YET),
        hint = ADD_ITEM_HINT,
    )
}

/// Permanent "order ended" announcement for the channel
pub fn render_summary(finalized: &FinalizedOrder, payout_reference: Option<&str>) -> String {
    let order = &finalized.order;
    let mut summary = format!(
        "Order from {} has ended (started by {}).\n\nFinal order list:\n{}",
        order.place,
        order.starter.name,
        item_lines(order.items(), NO_ITEMS_PLACED),
    );
    if let Some(reference) = payout_reference.map(str::trim).filter(|r| !r.is_empty()) {
        summary.push_str(&format!("\n\nPayment reference: {reference}"));
    }
    summary
}

/// Direct message sent to whoever ended the order
pub fn render_direct_summary(finalized: &FinalizedOrder) -> String {
    let order = &finalized.order;
    format!(
        "Final order list for {}:\n{}\n\nEnded by mistake? Use /restoreorder in the order channel to bring it back.",
        order.place,
        item_lines(order.items(), NO_ITEMS_PLACED),
    )
}
