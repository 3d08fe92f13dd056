use anyhow::Result;
use clap::Parser;

use food_order_bot::cli::commands::{
    register::RegisterCommandsCommand, reset::ResetChannelsCommand, serve::ServeCommand,
    show_config::ShowConfigCommand, simulate::SimulateCommand,
};
use food_order_bot::cli::{Cli, Commands};
use food_order_bot::config::FoodBotConfig;
use food_order_bot::telemetry::init_telemetry;

fn main() -> Result<()> {
    FoodBotConfig::load_env_file()?;
    let cli = Cli::parse();
    let config = FoodBotConfig::load_from(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        print_getting_started();
        return Ok(());
    };

    if let Err(e) = init_telemetry(&config.observability) {
        eprintln!("Warning: {e}");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match command {
            Commands::Serve { no_reset } => {
                ServeCommand::new(config)
                    .with_reset_on_start(!no_reset)
                    .execute()
                    .await
            }
            Commands::ResetChannels => ResetChannelsCommand::new(config).execute().await,
            Commands::RegisterCommands { dry_run } => {
                RegisterCommandsCommand::new(config)
                    .with_dry_run(dry_run)
                    .execute()
                    .await
            }
            Commands::Simulate { channel } => {
                SimulateCommand::new(config)
                    .with_channel(channel)
                    .execute()
                    .await
            }
            Commands::Config { write } => ShowConfigCommand::new(config)
                .with_write_path(write)
                .execute(),
        }
    })
}

fn print_getting_started() {
    println!("🍕 food-order-bot: group food orders for #food-order channels");
    println!();
    println!("🎯 GETTING STARTED:");
    println!("   → Set DISCORD_BOT_TOKEN and discord.public_key / discord.application_id");
    println!("   → Register slash commands: food-order-bot register-commands");
    println!("   → Run the bot:             food-order-bot serve");
    println!("   → Try it locally:          food-order-bot simulate < script.txt");
    println!();
    println!("💡 Run 'food-order-bot --help' for all commands");
}
