//! View abstraction driven by the controllers.
//!
//! The controllers never print or draw anything themselves. They talk to a
//! [`View`], which an embedding application implements: the terminal front
//! end prints, a test records.

mod render;
mod table;

pub use render::{audit_table, redeems_table, task_detail_table, tasks_table, users_table};
pub use table::{Action, ActionKind, Cell, Table, TableColumn};

use crate::error::ClientResult;

/// Places a controller can write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// Task list of the logged-in user.
    Tasks,
    /// Single task with live progress.
    TaskDetail,
    /// Coins needed for the visits being typed.
    CoinsNeeded,
    /// Audit trail.
    History,
    /// Admin user list.
    Users,
    /// Admin redeem list.
    Redeems,
}

/// Navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The dashboard landing page.
    Home,
}

/// Output surface of the dashboard.
///
/// `alert` and `prompt` are blocking by contract: the controller waits for
/// them before continuing.
pub trait View: Send + Sync {
    /// Show a message to the user.
    fn alert(&self, message: &str);

    /// Ask the user for a value. `None` means cancelled.
    fn prompt(&self, message: &str) -> Option<String>;

    /// Move to another page.
    fn navigate(&self, route: Route);

    /// Replace the contents of `area` with `table`.
    fn render(&self, area: Area, table: &Table);

    /// Replace the text of `area`.
    fn set_text(&self, area: Area, text: &str);
}

/// Alert user-facing errors, then hand the result back unchanged.
pub(crate) fn alert_on_error<T>(view: &dyn View, result: ClientResult<T>) -> ClientResult<T> {
    if let Err(err) = &result
        && err.is_user_facing()
    {
        view.alert(&err.alert_text());
    }
    result
}
