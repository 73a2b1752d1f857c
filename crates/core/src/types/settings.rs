//! Global settings published by `/api/settings`.

use serde::{Deserialize, Serialize};

use super::coins::coins_needed;

/// Server-side economy settings. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "VISITS_PER_COIN", default)]
    pub visits_per_coin: Option<i64>,
    #[serde(rename = "RUPEE_PER_COIN", default)]
    pub rupee_per_coin: Option<f64>,
    #[serde(rename = "SIGNUP_BONUS", default)]
    pub signup_bonus: Option<i64>,
    /// Seconds between worker polls of the visit counter.
    #[serde(rename = "HIT_INTERVAL", default)]
    pub hit_interval: Option<i64>,
}

impl Settings {
    /// Coins needed for `visits` at this server's rate.
    #[must_use]
    pub const fn coins_for(&self, visits: i64) -> i64 {
        coins_needed(visits, self.visits_per_coin)
    }
}
