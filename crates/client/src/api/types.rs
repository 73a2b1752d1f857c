//! Success payloads of the backend endpoints.

use serde::Deserialize;
use visit_panel_core::{TaskId, User, UserId};

/// Response from `/api/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Starting balance (the signup bonus).
    #[serde(default)]
    pub coins: Option<i64>,
}

/// Response from `/api/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// Response from `/api/tasks/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartedTask {
    pub task_id: TaskId,
    #[serde(default)]
    pub coins_used: Option<i64>,
}

/// Response from `/api/admin/redeems/{id}/approve`.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct Approval {
    #[serde(default)]
    pub credited: i64,
}
