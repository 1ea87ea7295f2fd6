//! Cache retention policies.

use crate::{Error, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How long a cached artifact is trusted before it is revalidated.
///
/// Within the window cached bytes are reused without touching the network.
/// Once the window has elapsed a conditional HEAD decides whether the bytes
/// can be kept (and the window renewed) or must be downloaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Always revalidate with the server.
    NoCache,
    /// Trust cached content for one hour.
    Hour,
    /// Trust cached content for one day.
    #[default]
    Day,
    /// Trust cached content for one week.
    Week,
}

impl RetentionPolicy {
    /// Length of the trust window.
    #[must_use]
    pub const fn window(self) -> TimeDelta {
        match self {
            Self::NoCache => TimeDelta::zero(),
            Self::Hour => TimeDelta::hours(1),
            Self::Day => TimeDelta::days(1),
            Self::Week => TimeDelta::weeks(1),
        }
    }

    /// Whether cached content may ever be reused without a network check.
    #[must_use]
    pub const fn allows_reuse(self) -> bool {
        !matches!(self, Self::NoCache)
    }

    /// Stable lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoCache => "no_cache",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "nocache" | "no_cache" | "no-cache" | "header" => Ok(Self::NoCache),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(Error::Config(format!(
                "Unknown retention policy '{s}' (expected no_cache, hour, day or week)"
            ))),
        }
    }
}
