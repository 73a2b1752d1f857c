//! Table builders for each dashboard view.

use visit_panel_core::{AuditEntry, Redeem, Task, User};

use super::table::{ActionKind, Cell, Table, TableColumn};

fn columns(defs: &[(&str, &str)]) -> Vec<TableColumn> {
    defs.iter()
        .map(|(key, label)| TableColumn::new(key, label))
        .collect()
}

/// Task list with a per-row stop action.
#[must_use]
pub fn tasks_table(tasks: &[Task]) -> Table {
    let mut table = Table::new(columns(&[
        ("id", "ID"),
        ("uid", "UID"),
        ("requested", "Req"),
        ("coins", "Coins"),
        ("status", "Status"),
        ("gained", "Gained"),
        ("action", "Act"),
    ]));

    for task in tasks {
        table.push_row(vec![
            Cell::text(task.id),
            Cell::text(&task.uid),
            Cell::text(task.requested_visits),
            Cell::text(task.coins_deducted),
            Cell::text(task.status),
            Cell::text(task.gained()),
            Cell::action(ActionKind::StopTask, task.id.as_i64()),
        ]);
    }
    table
}

/// Single task with counters and timestamps.
#[must_use]
pub fn task_detail_table(task: &Task) -> Table {
    let mut table = Table::new(columns(&[
        ("id", "ID"),
        ("uid", "UID"),
        ("status", "Status"),
        ("requested", "Req"),
        ("start", "Start"),
        ("last", "Last"),
        ("gained", "Gained"),
        ("created", "Created"),
        ("completed", "Completed"),
    ]));

    let counter = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();
    let timestamp = |value: Option<chrono::NaiveDateTime>| {
        value
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    };

    table.push_row(vec![
        Cell::text(task.id),
        Cell::text(&task.uid),
        Cell::text(task.status),
        Cell::text(task.requested.unwrap_or(task.requested_visits)),
        Cell::Text(counter(task.start_successful)),
        Cell::Text(counter(task.last_successful)),
        Cell::text(task.gained()),
        Cell::Text(timestamp(task.created_at)),
        Cell::Text(timestamp(task.completed_at)),
    ]);
    table
}

/// Admin user list with a per-row coin credit action.
#[must_use]
pub fn users_table(users: &[User]) -> Table {
    let mut table = Table::new(columns(&[
        ("id", "ID"),
        ("username", "Username"),
        ("coins", "Coins"),
        ("visits", "Visits"),
        ("action", "Action"),
    ]));

    for user in users {
        table.push_row(vec![
            Cell::text(user.id),
            Cell::text(&user.username),
            Cell::text(user.coins),
            Cell::text(user.visits()),
            Cell::action(ActionKind::AddCoins, user.id.as_i64()),
        ]);
    }
    table
}

/// Admin redeem list.
#[must_use]
pub fn redeems_table(redeems: &[Redeem]) -> Table {
    let mut table = Table::new(columns(&[
        ("id", "ID"),
        ("user", "User"),
        ("amount", "Amount"),
        ("code", "Code"),
        ("status", "Status"),
    ]));

    for redeem in redeems {
        table.push_row(vec![
            Cell::text(redeem.id),
            Cell::text(redeem.user_id),
            Cell::text(redeem.amount),
            Cell::text(&redeem.code),
            Cell::text(redeem.status),
        ]);
    }
    table
}

/// Audit trail, newest last as stored.
#[must_use]
pub fn audit_table(entries: &[AuditEntry]) -> Table {
    let mut table = Table::new(columns(&[
        ("id", "ID"),
        ("actor", "Actor"),
        ("user", "User"),
        ("action", "Action"),
        ("amount", "Amount"),
        ("note", "Note"),
    ]));

    for entry in entries {
        table.push_row(vec![
            Cell::text(entry.id),
            Cell::text(&entry.actor),
            Cell::Text(entry.user_id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::text(&entry.action),
            Cell::text(entry.amount),
            Cell::text(&entry.note),
        ]);
    }
    table
}
