use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::FoodBotConfig;

pub struct ShowConfigCommand {
    config: FoodBotConfig,
    write_path: Option<PathBuf>,
}

impl ShowConfigCommand {
    pub fn new(config: FoodBotConfig) -> Self {
        Self {
            config,
            write_path: None,
        }
    }

    pub fn with_write_path(mut self, write_path: Option<PathBuf>) -> Self {
        self.write_path = write_path;
        self
    }

    pub fn execute(&self) -> Result<()> {
        print!("{}", self.config.to_redacted_toml()?);

        if let Some(path) = &self.write_path {
            self.config
                .save_to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!();
            println!("✅ Configuration written to {}", path.display());
            println!("   💡 The bot token is not saved; set DISCORD_BOT_TOKEN instead");
        }
        Ok(())
    }
}
