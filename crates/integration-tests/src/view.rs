//! A [`View`] that records everything the controllers do to it.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use visit_panel_client::{Area, Route, Table, View};

/// One call made on the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Alert(String),
    Prompt(String),
    Navigate(Route),
    Render(Area, Table),
    Text(Area, String),
}

/// Recording view with scripted prompt answers.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    answers: Mutex<VecDeque<Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next prompt. `None` cancels it.
    pub fn answer_next(&self, answer: Option<&str>) {
        lock(&self.answers).push_back(answer.map(str::to_string));
    }

    #[must_use]
    pub fn events(&self) -> Vec<ViewEvent> {
        lock(&self.events).clone()
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Alert(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Prompt(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Navigate(route) => Some(route),
                _ => None,
            })
            .collect()
    }

    /// Every table rendered into `area`, oldest first.
    #[must_use]
    pub fn renders(&self, area: Area) -> Vec<Table> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Render(a, table) if a == area => Some(table),
                _ => None,
            })
            .collect()
    }

    /// The latest table rendered into `area`.
    #[must_use]
    pub fn last_render(&self, area: Area) -> Option<Table> {
        self.renders(area).pop()
    }

    /// The latest text written into `area`.
    #[must_use]
    pub fn last_text(&self, area: Area) -> Option<String> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                ViewEvent::Text(a, text) if a == area => Some(text),
                _ => None,
            })
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl View for RecordingView {
    fn alert(&self, message: &str) {
        lock(&self.events).push(ViewEvent::Alert(message.to_string()));
    }

    fn prompt(&self, message: &str) -> Option<String> {
        lock(&self.events).push(ViewEvent::Prompt(message.to_string()));
        lock(&self.answers).pop_front().flatten()
    }

    fn navigate(&self, route: Route) {
        lock(&self.events).push(ViewEvent::Navigate(route));
    }

    fn render(&self, area: Area, table: &Table) {
        lock(&self.events).push(ViewEvent::Render(area, table.clone()));
    }

    fn set_text(&self, area: Area, text: &str) {
        lock(&self.events).push(ViewEvent::Text(area, text.to_string()));
    }
}
