//! Social season: the user's current capacity for connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global mood modifier supplied by the caller on every run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// Low capacity; suggestions soften and thin out
    Resting,
    #[serde(alias = "balanced")]
    Normal,
    /// High capacity
    Blooming,
}

impl Season {
    pub fn is_resting(&self) -> bool {
        matches!(self, Season::Resting)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Resting => "resting",
            Season::Normal => "normal",
            Season::Blooming => "blooming",
        }
    }
}

impl Default for Season {
    fn default() -> Self {
        Season::Normal
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resting" => Ok(Season::Resting),
            "normal" | "balanced" => Ok(Season::Normal),
            "blooming" => Ok(Season::Blooming),
            other => Err(format!("unknown season: {other}")),
        }
    }
}
