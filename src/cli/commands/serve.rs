use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{discord_bot, print_lifecycle_report};
use crate::bot::spawn_message_sweep;
use crate::config::FoodBotConfig;
use crate::server::{build_router, ServerState, SignatureVerifier};
use crate::shutdown::shutdown_signal;

pub struct ServeCommand {
    config: FoodBotConfig,
    reset_on_start: bool,
}

impl ServeCommand {
    pub fn new(config: FoodBotConfig) -> Self {
        Self {
            config,
            reset_on_start: true,
        }
    }

    pub fn with_reset_on_start(mut self, reset_on_start: bool) -> Self {
        self.reset_on_start = reset_on_start;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let public_key = self
            .config
            .discord
            .public_key
            .as_deref()
            .context("discord.public_key is required to verify interaction requests")?;
        let verifier = SignatureVerifier::from_hex(public_key)
            .context("discord.public_key is not a valid Ed25519 key")?;
        if self.config.discord.application_id.is_none() {
            warn!("discord.application_id is not set; command replies cannot be delivered");
        }

        let (client, bot) = discord_bot(&self.config)?;

        if self.reset_on_start {
            let report = bot
                .reset_channels()
                .await
                .context("Failed to reset order channels")?;
            print_lifecycle_report(&report);
        }

        let sweep = match self.config.orders.sweep_interval_secs {
            0 => {
                warn!("Chatter sweep disabled; messages in order channels are left alone");
                None
            }
            secs => Some(spawn_message_sweep(bot.clone(), Duration::from_secs(secs))),
        };

        let state = Arc::new(ServerState {
            bot,
            verifier,
            responder: client.clone(),
        });
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(&self.config.server.bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.server.bind_address))?;
        info!(address = %self.config.server.bind_address, "Listening for interactions");
        println!(
            "🍕 Serving interactions on http://{}/interactions",
            self.config.server.bind_address
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Interaction server failed")?;

        if let Some(sweep) = sweep {
            sweep.abort();
        }

        client.metrics().log_stats();
        info!("Food order bot stopped");
        Ok(())
    }
}
