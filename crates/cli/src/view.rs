//! Terminal implementation of the dashboard view.

use std::io::{self, BufRead, Write};

use tracing::debug;
use visit_panel_client::{Area, Route, Table, View};

/// Prints to stdout and reads prompts from stdin.
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    fn heading(area: Area) -> &'static str {
        match area {
            Area::Tasks => "Tasks",
            Area::TaskDetail => "Task",
            Area::CoinsNeeded => "Coins needed",
            Area::History => "History",
            Area::Users => "Users",
            Area::Redeems => "Redeems",
        }
    }
}

impl View for TerminalView {
    fn alert(&self, message: &str) {
        let _ = writeln!(io::stdout().lock(), "{message}");
    }

    fn prompt(&self, message: &str) -> Option<String> {
        {
            let mut stdout = io::stdout().lock();
            let _ = write!(stdout, "{message}: ");
            let _ = stdout.flush();
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn navigate(&self, route: Route) {
        debug!(?route, "Navigate");
    }

    fn render(&self, area: Area, table: &Table) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "== {} ==", Self::heading(area));
        if table.is_empty() {
            let _ = writeln!(stdout, "(none)");
        } else {
            let _ = write!(stdout, "{table}");
        }
    }

    fn set_text(&self, area: Area, text: &str) {
        let _ = writeln!(io::stdout().lock(), "{}: {text}", Self::heading(area));
    }
}
