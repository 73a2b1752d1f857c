//! Audit trail entries and the `/api/history` payload.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::{AuditId, UserId};
use super::redeem::Redeem;
use super::task::Task;

/// One balance-changing event (signup bonus, task start, manual credit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    /// `system`, `user` or `admin`.
    pub actor: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub action: String,
    /// Coin delta; negative when coins were spent.
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// History of a user, or of the whole system when requested by an admin.
///
/// Redeems are only included in the admin variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub redeems: Vec<Redeem>,
}
