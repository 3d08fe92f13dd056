//! HTTP ingress for slash-command interactions.
//!
//! `build_router` is the single entry point; the `serve` subcommand binds it. Commands are
//! acknowledged straight away with a deferred caller-only response, run in
//! the background, and completed through an [`InteractionResponder`].

pub mod interaction;
pub mod signature;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::bot::{BotCommand, CommandInvocation, FoodOrderBot};
use crate::transport::{DiscordClient, TransportError};
use interaction::{Interaction, InteractionKind};
pub use signature::{SignatureError, SignatureVerifier};

/// Ephemeral flag on interaction responses
const EPHEMERAL: u64 = 1 << 6;

/// Completes a deferred interaction response
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn complete(&self, interaction_token: &str, content: &str) -> Result<(), TransportError>;
}

#[async_trait]
impl InteractionResponder for DiscordClient {
    async fn complete(&self, interaction_token: &str, content: &str) -> Result<(), TransportError> {
        self.edit_original_response(interaction_token, content).await
    }
}

pub struct ServerState {
    pub bot: Arc<FoodOrderBot>,
    pub verifier: SignatureVerifier,
    pub responder: Arc<dyn InteractionResponder>,
}

/// Build the interaction router wired to the given shared state
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/interactions", post(interactions))
        .with_state(state)
}

pub(crate) async fn health(State(st): State<Arc<ServerState>>) -> impl IntoResponse {
    let active_orders = st.bot.store().active_order_count().await;
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "service": "food-order-bot",
            "active_orders": active_orders,
        })),
    )
}

fn ephemeral_message(content: &str) -> Response {
    Json(json!({
        "type": 4,
        "data": { "content": content, "flags": EPHEMERAL },
    }))
    .into_response()
}

pub(crate) async fn interactions(
    State(st): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let (Some(signature), Some(timestamp)) =
        (header("x-signature-ed25519"), header("x-signature-timestamp"))
    else {
        return (StatusCode::UNAUTHORIZED, "missing request signature").into_response();
    };
    if !st.verifier.verify(timestamp, &body, signature) {
        warn!("Rejected interaction with an invalid signature");
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(error = %e, "Malformed interaction payload");
            return (StatusCode::BAD_REQUEST, "malformed interaction").into_response();
        }
    };

    match interaction.kind() {
        InteractionKind::Ping => Json(json!({ "type": 1 })).into_response(),
        InteractionKind::ApplicationCommand => handle_command(st, interaction).await,
        InteractionKind::Other(kind) => {
            debug!(kind, "Ignoring unsupported interaction type");
            (StatusCode::BAD_REQUEST, "unsupported interaction type").into_response()
        }
    }
}

async fn handle_command(st: Arc<ServerState>, interaction: Interaction) -> Response {
    let Some(data) = interaction.data.as_ref() else {
        return (StatusCode::BAD_REQUEST, "missing command data").into_response();
    };
    let command = match BotCommand::from_options(&data.name, &data.string_options()) {
        Ok(command) => command,
        Err(e) => return ephemeral_message(&e.to_string()),
    };
    let Some(user) = interaction.invoking_member() else {
        return (StatusCode::BAD_REQUEST, "missing invoking user").into_response();
    };
    let channel = match interaction.channel_info() {
        Some(channel) => channel,
        None => {
            let Some(channel_id) = interaction.channel_id() else {
                return ephemeral_message("This command can only be used in a server channel.");
            };
            match st.bot.transport().channel(channel_id).await {
                Ok(channel) => channel,
                Err(e) => {
                    error!(channel_id, error = %e, "Could not look up interaction channel");
                    return ephemeral_message(crate::bot::replies::TRANSPORT_FAILURE);
                }
            }
        }
    };

    let invocation = CommandInvocation { user, channel };
    let token = interaction.token.clone();
    tokio::spawn(async move {
        let reply = st.bot.dispatch(&invocation, command).await;
        if let Err(e) = st.responder.complete(&token, &reply.content).await {
            error!(error = %e, "Could not deliver command reply");
        }
    });

    Json(json!({ "type": 5, "data": { "flags": EPHEMERAL } })).into_response()
}
