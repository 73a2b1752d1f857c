//! Visit task as reported by the server.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::{TaskId, UserId};
use super::status::TaskStatus;

/// A server-tracked unit of work that buys visits for a target UID.
///
/// Progress is reported through the external visit counter: the worker
/// snapshots `start_successful` when it starts and keeps `last_successful`
/// current. Both are `null` until the worker has run once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub uid: String,
    pub requested_visits: i64,
    pub coins_deducted: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub start_successful: Option<i64>,
    #[serde(default)]
    pub last_successful: Option<i64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    /// Append-only worker log (API errors, stop markers).
    #[serde(default)]
    pub note: String,
    /// Requested visit count echoed by the live progress record.
    ///
    /// Only present on the single-task endpoint while a worker is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
}

impl Task {
    /// Visits gained since the worker started. Missing counters count as 0.
    #[must_use]
    pub fn gained(&self) -> i64 {
        self.last_successful.unwrap_or(0) - self.start_successful.unwrap_or(0)
    }
}
