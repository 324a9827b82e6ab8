//! Dataset topics.
//!
//! Each topic names one fixed tabular store. The set is closed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// One of the fixed medical topic areas backed by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Heart,
    Cancer,
    Diabetes,
}

impl Topic {
    /// All topics, in routing priority order.
    pub const ALL: [Topic; 3] = [Topic::Heart, Topic::Cancer, Topic::Diabetes];

    /// Get the canonical topic key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Cancer => "cancer",
            Self::Diabetes => "diabetes",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heart" => Ok(Self::Heart),
            "cancer" => Ok(Self::Cancer),
            "diabetes" => Ok(Self::Diabetes),
            other => Err(AppError::Config(format!(
                "Unknown topic: {}. Supported: heart, cancer, diabetes",
                other
            ))),
        }
    }
}
