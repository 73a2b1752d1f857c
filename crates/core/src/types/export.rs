//! Data files an admin can download through `/export/{name}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown export name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown export target: {0}. Valid targets: users, tasks, redeems, audit, settings")]
pub struct ExportTargetError(pub String);

/// A backend data file available for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTarget {
    Users,
    Tasks,
    Redeems,
    Audit,
    Settings,
}

impl ExportTarget {
    /// Path segment used by the export endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Tasks => "tasks",
            Self::Redeems => "redeems",
            Self::Audit => "audit",
            Self::Settings => "settings",
        }
    }

    /// Default file name for a downloaded export.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportTarget {
    type Err = ExportTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Self::Users),
            "tasks" => Ok(Self::Tasks),
            "redeems" => Ok(Self::Redeems),
            "audit" => Ok(Self::Audit),
            "settings" => Ok(Self::Settings),
            _ => Err(ExportTargetError(s.to_owned())),
        }
    }
}
