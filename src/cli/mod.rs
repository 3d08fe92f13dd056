use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "food-order-bot")]
#[command(about = "Coordinate group food orders in Discord channels")]
#[command(long_about = "Runs one shared food order per #food-order channel: someone starts an \
                       order, everyone adds what they want, and the final list is posted when \
                       the order ends. Get started with 'food-order-bot serve'.")]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reset order channels and serve slash-command interactions over HTTP
    Serve {
        /// Skip clearing order channels on startup
        #[arg(long, help = "Do not clear channel history or repost status messages on startup")]
        no_reset: bool,
    },
    /// Clear every order channel and post a fresh status message
    ResetChannels,
    /// Register the bot's slash commands with Discord
    RegisterCommands {
        /// Print the command definitions instead of sending them
        #[arg(long, help = "Show the command definitions without registering them")]
        dry_run: bool,
    },
    /// Drive the bot from a script on stdin against an in-memory chat
    Simulate {
        /// Name of the simulated order channel (defaults to the configured prefix)
        #[arg(long, help = "Channel name used for the simulated conversation")]
        channel: Option<String>,
    },
    /// Print the effective configuration with secrets redacted
    Config {
        /// Also write the configuration to this file (the token is never written)
        #[arg(long, value_name = "PATH", help = "Write the effective configuration to a TOML file")]
        write: Option<PathBuf>,
    },
}
