//! End-to-end order flows against the in-memory chat transport

use food_order_bot::bot::{replies, spawn_message_sweep, SweepReport};
use food_order_bot::orders::Member;
use food_order_bot::transport::{ChannelInfo, InMemoryTransport, UserInfo};
use food_order_bot::{
    BotCommand, BotSettings, CommandInvocation, CommandOutcome, FoodOrderBot, IncomingMessage,
};
use std::sync::Arc;
use std::time::Duration;

const BOT_ID: u64 = 1;
const ORDER_CHANNEL: u64 = 10;
const GENERAL: u64 = 20;

struct Harness {
    transport: Arc<InMemoryTransport>,
    bot: Arc<FoodOrderBot>,
}

impl Harness {
    async fn new() -> Self {
        let transport = Arc::new(InMemoryTransport::new(UserInfo {
            id: BOT_ID,
            name: "foodbot".to_string(),
        }));
        transport
            .add_channel(ChannelInfo::new(ORDER_CHANNEL, "food-order"))
            .await;
        transport.add_channel(ChannelInfo::new(GENERAL, "general")).await;
        let bot = Arc::new(FoodOrderBot::new(transport.clone(), BotSettings::default()));
        bot.reset_channels().await.unwrap();
        Self { transport, bot }
    }

    fn invocation(user_id: u64, name: &str) -> CommandInvocation {
        CommandInvocation {
            user: Member::new(user_id, name),
            channel: ChannelInfo::new(ORDER_CHANNEL, "food-order"),
        }
    }

    async fn run(&self, user_id: u64, name: &str, command: BotCommand) -> (String, CommandOutcome) {
        let reply = self
            .bot
            .dispatch(&Self::invocation(user_id, name), command)
            .await;
        (reply.content, reply.outcome)
    }

    /// Post a plain message and let the bot react to it
    async fn post(&self, author: u64, text: &str) -> (u64, bool) {
        let message_id = self.transport.post_as(ORDER_CHANNEL, author, text).await;
        let removed = self
            .bot
            .on_message(&IncomingMessage {
                channel: ChannelInfo::new(ORDER_CHANNEL, "food-order"),
                author_id: author,
                message_id,
            })
            .await
            .unwrap();
        (message_id, removed)
    }

    async fn contents(&self) -> Vec<String> {
        self.transport
            .messages(ORDER_CHANNEL)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect()
    }
}

fn start(place: &str, time: &str) -> BotCommand {
    BotCommand::StartOrder {
        place: place.to_string(),
        time: time.to_string(),
    }
}

fn add(order: &str) -> BotCommand {
    BotCommand::AddOrder {
        order: order.to_string(),
    }
}

#[tokio::test]
async fn pizza_night_from_start_to_restore() {
    let h = Harness::new().await;
    assert_eq!(h.contents().await, vec!["No active order."]);

    let (reply, outcome) = h.run(2, "alice", start("Pizza Place", "19:00")).await;
    assert_eq!(reply, replies::ORDER_STARTED);
    assert_eq!(outcome, CommandOutcome::Succeeded);

    h.run(3, "bob", add("margherita")).await;
    h.run(3, "bob", add("pepperoni")).await;
    let (reply, _) = h.run(4, "carol", add("salad")).await;
    assert_eq!(reply, replies::ORDER_UPDATED);

    let contents = h.contents().await;
    assert_eq!(contents.len(), 1);
    let status = &contents[0];
    assert!(status.starts_with("Order in progress by alice"));
    assert!(status.contains("From: Pizza Place"));
    assert!(status.contains("Order before: 19:00"));
    assert!(status.contains("Current orders:\nbob: pepperoni\ncarol: salad"));
    assert!(!status.contains("margherita"));

    let (reply, _) = h
        .run(
            2,
            "alice",
            BotCommand::EndOrder {
                payout_reference: Some("NL00BANK0123".to_string()),
            },
        )
        .await;
    assert_eq!(reply, replies::ORDER_FINALIZED);

    let contents = h.contents().await;
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0], "No active order.");
    assert!(contents[1].starts_with("Order from Pizza Place has ended (started by alice)."));
    assert!(contents[1].contains("bob: pepperoni\ncarol: salad"));
    assert!(contents[1].ends_with("Payment reference: NL00BANK0123"));

    let dms = h.transport.direct_messages(2).await;
    assert_eq!(dms.len(), 1);
    assert!(dms[0].starts_with("Final order list for Pizza Place:"));

    let (reply, _) = h.run(3, "bob", BotCommand::RestoreOrder).await;
    assert_eq!(reply, replies::ORDER_RESTORED);

    let contents = h.contents().await;
    assert_eq!(contents.len(), 1, "ended-order announcement is removed");
    assert!(contents[0].contains("bob: pepperoni\ncarol: salad"));

    let (reply, outcome) = h.run(3, "bob", BotCommand::RestoreOrder).await;
    assert_eq!(reply, "An order is already in progress, cannot restore another order.");
    assert_eq!(outcome, CommandOutcome::Rejected);
    assert!(h.transport.direct_messages(3).await.is_empty());
}

#[tokio::test]
async fn restore_without_backup_is_rejected_quietly() {
    let h = Harness::new().await;

    let (reply, outcome) = h.run(2, "alice", BotCommand::RestoreOrder).await;
    assert_eq!(reply, "No order available to restore.");
    assert_eq!(outcome, CommandOutcome::Rejected);
    assert!(h.transport.direct_messages(2).await.is_empty());
}

#[tokio::test]
async fn second_start_is_rejected_and_notified_directly() {
    let h = Harness::new().await;
    h.run(2, "alice", start("Sushi Bar", "12:00")).await;

    let (reply, outcome) = h.run(3, "bob", start("Burger Joint", "12:30")).await;
    assert_eq!(reply, "An order is already in progress.");
    assert_eq!(outcome, CommandOutcome::Rejected);
    assert_eq!(
        h.transport.direct_messages(3).await,
        vec!["An order is already in progress."]
    );
    assert!(h.contents().await[0].contains("From: Sushi Bar"));
}

#[tokio::test]
async fn commands_outside_order_channels_do_nothing() {
    let h = Harness::new().await;
    let invocation = CommandInvocation {
        user: Member::new(2, "alice"),
        channel: ChannelInfo::new(GENERAL, "general"),
    };

    let reply = h.bot.dispatch(&invocation, start("Pizza Place", "19:00")).await;
    assert_eq!(reply.outcome, CommandOutcome::Rejected);
    assert_eq!(
        reply.content,
        "This command can only be used in channels whose name starts with #food-order."
    );
    assert!(h.bot.store().active_order(GENERAL).await.is_none());
    assert!(h.transport.messages(GENERAL).await.is_empty());
}

#[tokio::test]
async fn clearing_your_own_item() {
    let h = Harness::new().await;

    let (reply, _) = h.run(3, "bob", BotCommand::ClearOrder).await;
    assert_eq!(reply, "No active order.");

    h.run(2, "alice", start("Pizza Place", "19:00")).await;
    let (reply, _) = h.run(3, "bob", BotCommand::ClearOrder).await;
    assert_eq!(reply, "You have no items in the current order.");

    h.run(3, "bob", add("calzone")).await;
    h.run(4, "carol", add("salad")).await;
    let (reply, outcome) = h.run(3, "bob", BotCommand::ClearOrder).await;
    assert_eq!(reply, replies::ORDER_REMOVED);
    assert_eq!(outcome, CommandOutcome::Succeeded);

    let status = &h.contents().await[0];
    assert!(!status.contains("calzone"));
    assert!(status.contains("carol: salad"));
}

#[tokio::test]
async fn chatter_is_removed_only_while_an_order_runs() {
    let h = Harness::new().await;
    let (idle_id, removed) = h.post(3, "anyone hungry?").await;
    assert!(!removed);
    assert!(h.transport.message(ORDER_CHANNEL, idle_id).await.is_some());

    h.run(2, "alice", start("Pizza Place", "19:00")).await;

    let (chatter_id, removed) = h.post(3, "I'll have a pizza").await;
    assert!(removed);
    assert!(h.transport.message(ORDER_CHANNEL, chatter_id).await.is_none());

    let (own_id, removed) = h.post(BOT_ID, "bot note").await;
    assert!(!removed);
    assert!(h.transport.message(ORDER_CHANNEL, own_id).await.is_some());
}

#[tokio::test]
async fn sweep_removes_chatter_from_running_orders_only() {
    let h = Harness::new().await;
    let idle = h.transport.post_as(ORDER_CHANNEL, 3, "anyone hungry?").await;
    let report = h.bot.sweep_active_channels().await;
    assert_eq!(report, SweepReport::default());
    assert!(h.transport.message(ORDER_CHANNEL, idle).await.is_some());

    h.run(2, "alice", start("Pizza Place", "19:00")).await;
    let chatter = h.transport.post_as(ORDER_CHANNEL, 3, "pizza again?").await;
    let more = h.transport.post_as(ORDER_CHANNEL, 4, "yes please").await;
    let elsewhere = h.transport.post_as(GENERAL, 3, "hello").await;

    let report = h.bot.sweep_active_channels().await;
    assert_eq!(report.channels_swept, 1);
    assert_eq!(report.messages_removed, 2);
    assert!(h.transport.message(ORDER_CHANNEL, chatter).await.is_none());
    assert!(h.transport.message(ORDER_CHANNEL, more).await.is_none());
    assert!(h.transport.message(GENERAL, elsewhere).await.is_some());

    let contents = h.contents().await;
    assert_eq!(contents.len(), 1, "status message survives the sweep");
    assert!(contents[0].starts_with("Order in progress by alice"));
}

#[tokio::test(start_paused = true)]
async fn background_sweep_runs_on_an_interval() {
    let h = Harness::new().await;
    h.run(2, "alice", start("Pizza Place", "19:00")).await;
    let sweep = spawn_message_sweep(h.bot.clone(), Duration::from_secs(5));

    let chatter = h.transport.post_as(ORDER_CHANNEL, 3, "pizza again?").await;
    tokio::time::sleep(Duration::from_secs(6)).await;
    sweep.abort();

    assert!(h.transport.message(ORDER_CHANNEL, chatter).await.is_none());
}

#[tokio::test]
async fn starting_an_order_clears_old_history() {
    let h = Harness::new().await;
    h.transport.post_as(ORDER_CHANNEL, 3, "yesterday's chatter").await;
    h.transport.post_as(ORDER_CHANNEL, 4, "more chatter").await;

    h.run(2, "alice", start("Pizza Place", "19:00")).await;

    let contents = h.contents().await;
    assert_eq!(contents.len(), 1);
    assert!(contents[0].starts_with("Order in progress by alice"));
}

#[tokio::test]
async fn lost_status_message_is_reposted() {
    let h = Harness::new().await;
    h.run(2, "alice", start("Pizza Place", "19:00")).await;

    let status_id = h.bot.store().status_message(ORDER_CHANNEL).await.unwrap();
    h.transport.remove_silently(ORDER_CHANNEL, status_id).await;

    let (reply, _) = h.run(3, "bob", add("margherita")).await;
    assert_eq!(reply, replies::ORDER_UPDATED);

    let new_id = h.bot.store().status_message(ORDER_CHANNEL).await.unwrap();
    assert_ne!(new_id, status_id);
    let contents = h.contents().await;
    assert_eq!(contents.len(), 1);
    assert!(contents[0].contains("bob: margherita"));
}

#[tokio::test]
async fn transport_failure_keeps_the_recorded_item() {
    let h = Harness::new().await;
    h.run(2, "alice", start("Pizza Place", "19:00")).await;

    h.transport.fail_sends(true).await;
    let (reply, outcome) = h.run(3, "bob", add("margherita")).await;
    assert_eq!(reply, replies::TRANSPORT_FAILURE);
    assert_eq!(outcome, CommandOutcome::Failed);

    let order = h.bot.store().active_order(ORDER_CHANNEL).await.unwrap();
    assert_eq!(order.item_for(3).map(|i| i.text.as_str()), Some("margherita"));

    h.transport.fail_sends(false).await;
    h.run(4, "carol", add("salad")).await;
    assert!(h.contents().await[0].contains("bob: margherita\ncarol: salad"));
}

#[tokio::test]
async fn failed_announcement_keeps_the_order_running() {
    let h = Harness::new().await;
    h.run(2, "alice", start("Pizza Place", "19:00")).await;
    h.run(3, "bob", add("salad")).await;
    let end = || BotCommand::EndOrder {
        payout_reference: None,
    };

    h.transport.fail_sends(true).await;
    let (reply, outcome) = h.run(2, "alice", end()).await;
    assert_eq!(reply, replies::TRANSPORT_FAILURE);
    assert_eq!(outcome, CommandOutcome::Failed);
    assert!(h.bot.store().active_order(ORDER_CHANNEL).await.is_some());
    assert!(h.bot.store().backup(ORDER_CHANNEL).await.is_none());
    assert!(h.transport.direct_messages(2).await.is_empty());

    h.transport.fail_sends(false).await;
    let (reply, outcome) = h.run(2, "alice", end()).await;
    assert_eq!(reply, replies::ORDER_FINALIZED);
    assert_eq!(outcome, CommandOutcome::Succeeded);
    assert!(h.bot.store().active_order(ORDER_CHANNEL).await.is_none());

    let contents = h.contents().await;
    assert_eq!(contents[0], "No active order.");
    assert!(contents[1].contains("bob: salad"));
    assert_eq!(h.transport.direct_messages(2).await.len(), 1);
}

#[tokio::test]
async fn concurrent_starts_produce_one_order() {
    let h = Harness::new().await;
    let mut handles = Vec::new();
    for user in 2..12u64 {
        let bot = h.bot.clone();
        handles.push(tokio::spawn(async move {
            let invocation = Harness::invocation(user, &format!("user{user}"));
            bot.dispatch(&invocation, start("Noodle House", "13:00")).await
        }));
    }

    let mut started = 0;
    for handle in handles {
        if handle.await.unwrap().outcome == CommandOutcome::Succeeded {
            started += 1;
        }
    }
    assert_eq!(started, 1);
    assert_eq!(h.bot.store().active_order_count().await, 1);
}

#[tokio::test]
async fn concurrent_adds_are_all_recorded() {
    let h = Harness::new().await;
    h.run(2, "alice", start("Noodle House", "13:00")).await;

    let mut handles = Vec::new();
    for user in 10..30u64 {
        let bot = h.bot.clone();
        handles.push(tokio::spawn(async move {
            let invocation = Harness::invocation(user, &format!("user{user}"));
            bot.dispatch(&invocation, add(&format!("noodles #{user}"))).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().outcome, CommandOutcome::Succeeded);
    }

    let order = h.bot.store().active_order(ORDER_CHANNEL).await.unwrap();
    assert_eq!(order.items().len(), 20);
    assert_eq!(h.contents().await.len(), 1);
}

#[tokio::test]
async fn help_is_sent_directly() {
    let h = Harness::new().await;
    let (reply, _) = h.run(3, "bob", BotCommand::Help).await;
    assert_eq!(reply, replies::HELP_SENT);

    let dms = h.transport.direct_messages(3).await;
    assert_eq!(dms.len(), 1);
    assert!(dms[0].contains("/startorder"));
    assert!(dms[0].contains("/restoreorder"));
}
