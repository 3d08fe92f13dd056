//! The slash-command surface: parsing invocations into [`BotCommand`] and the
//! definitions registered with Discord.

use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    StartOrder { place: String, time: String },
    AddOrder { order: String },
    EndOrder { payout_reference: Option<String> },
    RestoreOrder,
    ClearOrder,
    Help,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("Unknown command: /{name}")]
    UnknownCommand { name: String },
    #[error("/{command} needs a value for '{argument}'")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

impl BotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::StartOrder { .. } => "startorder",
            BotCommand::AddOrder { .. } => "addorder",
            BotCommand::EndOrder { .. } => "endorder",
            BotCommand::RestoreOrder => "restoreorder",
            BotCommand::ClearOrder => "clearorder",
            BotCommand::Help => "help",
        }
    }

    /// Build a command from named options, as delivered by an interaction
    pub fn from_options(name: &str, options: &[(String, String)]) -> Result<Self, CommandParseError> {
        let get = |key: &str| {
            options
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        let require = |command: &'static str, key: &'static str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(CommandParseError::MissingArgument {
                    command,
                    argument: key,
                })
        };

        match name {
            "startorder" => Ok(BotCommand::StartOrder {
                place: require("startorder", "place")?,
                time: require("startorder", "time")?,
            }),
            "addorder" => Ok(BotCommand::AddOrder {
                order: require("addorder", "order")?,
            }),
            "endorder" => Ok(BotCommand::EndOrder {
                payout_reference: get("payout_reference").filter(|v| !v.trim().is_empty()),
            }),
            "restoreorder" => Ok(BotCommand::RestoreOrder),
            "clearorder" => Ok(BotCommand::ClearOrder),
            "help" => Ok(BotCommand::Help),
            other => Err(CommandParseError::UnknownCommand {
                name: other.to_string(),
            }),
        }
    }

    /// Build a command from positional arguments, as typed in a script.
    /// `addorder` joins all of its arguments into one order text.
    pub fn from_args(name: &str, args: &[String]) -> Result<Self, CommandParseError> {
        let positional: &[&str] = match name {
            "startorder" => &["place", "time"],
            "endorder" => &["payout_reference"],
            _ => &[],
        };
        let mut options: Vec<(String, String)> = positional
            .iter()
            .zip(args.iter())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        if name == "addorder" && !args.is_empty() {
            options.push(("order".to_string(), args.join(" ")));
        }
        Self::from_options(name, &options)
    }
}

pub fn help_text() -> String {
    [
        "Food order commands:",
        "/startorder place time - start a new food order in this channel",
        "/addorder order - add your order (replaces any order you added before)",
        "/clearorder - remove your order from the current list",
        "/endorder [payout_reference] - finalize the order and post the final list",
        "/restoreorder - bring back the last ended order if it was ended by mistake",
        "/help - show this list",
    ]
    .join("\n")
}

fn string_option(name: &str, description: &str, required: bool) -> Value {
    json!({
        "type": 3,
        "name": name,
        "description": description,
        "required": required,
    })
}

/// Global application command definitions
pub fn command_definitions() -> Value {
    json!([
        {
            "name": "startorder",
            "description": "Start a new food order",
            "options": [
                string_option("place", "Where the food is ordered from", true),
                string_option("time", "Order before this time", true),
            ],
        },
        {
            "name": "addorder",
            "description": "Add an item to the current order (will overwrite any previous order)",
            "options": [string_option("order", "What you would like", true)],
        },
        {
            "name": "endorder",
            "description": "Finalize the current order",
            "options": [string_option("payout_reference", "Where people can pay you back", false)],
        },
        {
            "name": "restoreorder",
            "description": "Restore the last ended order if it was ended by mistake",
        },
        {
            "name": "clearorder",
            "description": "Remove your item from the current order",
        },
        {
            "name": "help",
            "description": "List the food order commands",
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_start_order_options() {
        let cmd = BotCommand::from_options(
            "startorder",
            &opts(&[("time", "19:00"), ("place", "Pizza Place")]),
        )
        .unwrap();
        assert_eq!(
            cmd,
            BotCommand::StartOrder {
                place: "Pizza Place".to_string(),
                time: "19:00".to_string()
            }
        );
    }

    #[test]
    fn missing_required_option_is_reported() {
        let err = BotCommand::from_options("addorder", &[]).unwrap_err();
        assert_eq!(
            err,
            CommandParseError::MissingArgument {
                command: "addorder",
                argument: "order"
            }
        );
    }

    #[test]
    fn payout_reference_is_optional() {
        assert_eq!(
            BotCommand::from_options("endorder", &[]).unwrap(),
            BotCommand::EndOrder {
                payout_reference: None
            }
        );
    }

    #[test]
    fn positional_add_order_joins_words() {
        let args = vec!["large".to_string(), "pepperoni".to_string()];
        assert_eq!(
            BotCommand::from_args("addorder", &args).unwrap(),
            BotCommand::AddOrder {
                order: "large pepperoni".to_string()
            }
        );
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(matches!(
            BotCommand::from_args("pizza", &[]),
            Err(CommandParseError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn every_command_has_a_definition() {
        let defs = command_definitions();
        let names: Vec<_> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        for name in ["startorder", "addorder", "endorder", "restoreorder", "clearorder", "help"] {
            assert!(names.contains(&name.to_string()), "missing {name}");
            assert!(help_text().contains(&format!("/{name}")));
        }
    }
}
