use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Channel name starts with the convention, e.g. `food-order-friday`
    #[default]
    Prefix,
    /// Channel name equals the convention
    Exact,
}

/// Decides which channels order commands may run in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGate {
    convention: String,
    mode: MatchMode,
}

impl Default for ChannelGate {
    fn default() -> Self {
        Self::new("food-order", MatchMode::Prefix)
    }
}

impl ChannelGate {
    pub fn new(convention: &str, mode: MatchMode) -> Self {
        Self {
            convention: convention.to_string(),
            mode,
        }
    }

    pub fn convention(&self) -> &str {
        &self.convention
    }

    pub fn is_eligible(&self, channel_name: &str) -> bool {
        match self.mode {
            MatchMode::Prefix => channel_name.starts_with(&self.convention),
            MatchMode::Exact => channel_name == self.convention,
        }
    }

    pub fn rejection_message(&self) -> String {
        match self.mode {
            MatchMode::Prefix => format!(
                "This command can only be used in channels whose name starts with #{}.",
                self.convention
            ),
            MatchMode::Exact => format!(
                "This command can only be used in the #{} channel.",
                self.convention
            ),
        }
    }
}
