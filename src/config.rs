//! Configuration Module
//!
//! Handles loading map configuration from environment variables.

use std::env;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::map::LOOKAHEAD_WINDOW;

/// Default TTL in seconds when `DEFAULT_TTL` is unset or unparsable.
const DEFAULT_TTL_SECS: u64 = 300;

/// Map configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Default TTL in seconds, None = entries never expire
    pub default_ttl_secs: Option<u64>,
    /// Number of front entries inspected by the bounded-lookahead purge
    pub lookahead: usize,
}

impl MapConfig {
    /// Creates a new MapConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds, `0` or `none` disables expiry (default: 300)
    /// - `LOOKAHEAD_WINDOW` - Bounded-lookahead window size (default: 5)
    pub fn from_env() -> Self {
        Self {
            default_ttl_secs: parse_ttl(env::var("DEFAULT_TTL").ok().as_deref()),
            lookahead: env::var("LOOKAHEAD_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(LOOKAHEAD_WINDOW),
        }
    }

    /// Default TTL as a duration, saturating at `Duration::MAX`.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_secs.map(|secs| {
            i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX)
        })
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: Some(DEFAULT_TTL_SECS),
            lookahead: LOOKAHEAD_WINDOW,
        }
    }
}

fn parse_ttl(raw: Option<&str>) -> Option<u64> {
    match raw.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("none") => None,
        Some(v) => match v.parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(secs),
            Err(_) => Some(DEFAULT_TTL_SECS),
        },
        None => Some(DEFAULT_TTL_SECS),
    }
}
