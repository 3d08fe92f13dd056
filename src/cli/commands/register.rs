use anyhow::{Context, Result};

use crate::bot::command_definitions;
use crate::config::FoodBotConfig;
use crate::transport::DiscordClient;

pub struct RegisterCommandsCommand {
    config: FoodBotConfig,
    dry_run: bool,
}

impl RegisterCommandsCommand {
    pub fn new(config: FoodBotConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let definitions = command_definitions();
        if self.dry_run {
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            return Ok(());
        }

        let client =
            DiscordClient::new(&self.config.discord).context("Failed to create Discord client")?;
        let registered = client
            .register_commands(&definitions)
            .await
            .context("Failed to register slash commands")?;
        println!("✅ Registered {} slash command(s)", registered);
        Ok(())
    }
}
