//! Dashboard user as returned by login and the admin user list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A registered user. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub total_visits: Option<i64>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    /// Lifetime visits delivered. A missing or null counter counts as 0.
    #[must_use]
    pub fn visits(&self) -> i64 {
        self.total_visits.unwrap_or(0)
    }
}
