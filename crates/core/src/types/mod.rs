//! Core types for Visit Panel.
//!
//! This module provides type-safe wrappers for the server's entities.

pub mod audit;
pub mod coins;
pub mod export;
pub mod id;
pub mod redeem;
pub mod settings;
pub mod status;
pub mod task;
pub mod user;

pub use audit::{AuditEntry, History};
pub use coins::{DEFAULT_VISITS_PER_COIN, coins_needed};
pub use export::{ExportTarget, ExportTargetError};
pub use id::*;
pub use redeem::Redeem;
pub use settings::Settings;
pub use status::*;
pub use task::Task;
pub use user::User;
