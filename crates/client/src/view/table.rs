//! Table component types.
//!
//! A [`Table`] is the snapshot a controller hands to the view. It renders
//! as aligned plain text through `Display`.

use std::fmt;

/// Column definition for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
}

impl TableColumn {
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// What a row action does when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Stop the task in this row.
    StopTask,
    /// Prompt for coins to credit to the user in this row.
    AddCoins,
}

impl ActionKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StopTask => "Stop",
            Self::AddCoins => "Add",
        }
    }
}

/// A button bound to the entity of its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    /// ID of the task or user the action applies to.
    pub target: i64,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Action(Action),
}

impl Cell {
    /// Text cell from anything displayable.
    pub fn text(value: impl ToString) -> Self {
        Self::Text(value.to_string())
    }

    #[must_use]
    pub const fn action(kind: ActionKind, target: i64) -> Self {
        Self::Action(Action { kind, target })
    }

    fn plain(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Action(action) => format!("[{} #{}]", action.kind.label(), action.target),
        }
    }
}

/// Rows of cells under a fixed set of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<TableColumn>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    #[must_use]
    pub const fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing trailing cells render empty; extra cells are dropped.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Cell of `row` under the column keyed `key`.
    #[must_use]
    pub fn cell(&self, row: usize, key: &str) -> Option<&Cell> {
        let column = self.columns.iter().position(|c| c.key == key)?;
        self.rows.get(row)?.get(column)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                (0..self.columns.len())
                    .map(|index| row.get(index).map(Cell::plain).unwrap_or_default())
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                rows.iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.label.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<&str> = self.columns.iter().map(|c| c.label.as_str()).collect();
        write_line(f, &header, &widths)?;

        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        let rule: Vec<&str> = rule.iter().map(String::as_str).collect();
        write_line(f, &rule, &widths)?;

        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            write_line(f, &cells, &widths)?;
        }
        Ok(())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[&str], widths: &[usize]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(f, "{}", line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(vec![
            TableColumn::new("id", "ID"),
            TableColumn::new("name", "Name"),
            TableColumn::new("act", "Act"),
        ]);
        table.push_row(vec![
            Cell::text(1),
            Cell::text("<b>bob</b>"),
            Cell::action(ActionKind::StopTask, 1),
        ]);
        table
    }

    #[test]
    fn test_empty_table_renders_header_only() {
        let table = Table::new(vec![TableColumn::new("id", "ID")]);
        assert!(table.is_empty());
        assert_eq!(table.to_string(), "ID\n--\n");
    }

    #[test]
    fn test_text_rendering_aligns_columns() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.first().copied(), Some("ID  Name        Act"));
        assert_eq!(lines.get(1).copied(), Some("--  ----------  ---------"));
        assert_eq!(lines.get(2).copied(), Some("1   <b>bob</b>  [Stop #1]"));
    }

    #[test]
    fn test_short_rows_render_empty_cells() {
        let mut table = Table::new(vec![TableColumn::new("a", "A"), TableColumn::new("b", "B")]);
        table.push_row(vec![Cell::text("x")]);
        assert_eq!(table.to_string().lines().nth(2), Some("x"));
        assert!(table.cell(0, "b").is_none());
        assert_eq!(table.cell(0, "a"), Some(&Cell::text("x")));
    }
}
