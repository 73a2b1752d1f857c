//! Redeem requests shown in the admin panel.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::{RedeemId, UserId};
use super::status::RedeemStatus;

/// A user request to convert an external code into coins.
///
/// `amount` is in rupees; the server credits `floor(amount / RUPEE_PER_COIN)`
/// coins on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redeem {
    pub id: RedeemId,
    pub user_id: UserId,
    pub amount: f64,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: RedeemStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}
