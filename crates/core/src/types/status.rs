//! Status enums for tasks and redeem requests.
//!
//! The server stores statuses as lowercase strings. Values this client does
//! not know about deserialize to `Unknown` instead of failing the whole
//! collection, so a newer backend never blanks an entire table.

use serde::{Deserialize, Serialize};

/// Lifecycle of a visit task.
///
/// `pending` → `running` → (`completed` | `stopped`). Transitions happen on
/// the server; a stop request only flags the worker, so the status lags
/// behind the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Stopped,
    Completed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Completed => write!(f, "completed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Status of a redeem request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RedeemStatus {
    #[default]
    Pending,
    Approved,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RedeemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
