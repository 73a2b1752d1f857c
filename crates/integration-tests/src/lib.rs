//! Integration tests for the Visit Panel client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p visit-panel-integration-tests
//! ```
//!
//! No external services are needed: each test starts a [`MockBackend`] on an
//! ephemeral local port and drives the controllers against it through a
//! [`RecordingView`].
//!
//! # Test Categories
//!
//! - `auth_flow` - Registration, login, logout and session persistence
//! - `tasks` - Coin calculator, task start/stop, listing and polling
//! - `admin_panel` - Users, coin credits, redeems, history and exports

#![cfg_attr(not(test), forbid(unsafe_code))]

mod backend;
mod view;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use backend::{ADMIN_PASS, MockBackend, RecordedRequest};
pub use view::{RecordingView, ViewEvent};

use visit_panel_client::{
    AdminPanel, ApiClient, ClientConfig, ClientResult, Dashboard, LogFormat, SessionStore, View,
};

/// Backend, view and controllers wired together.
pub struct TestContext {
    pub backend: MockBackend,
    pub view: Arc<RecordingView>,
    pub config: ClientConfig,
    pub dashboard: Dashboard,
    pub admin: AdminPanel,
}

impl TestContext {
    /// Start a backend and build controllers over an in-memory session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot bind or the client cannot be
    /// built.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_sessions(SessionStore::memory()).await
    }

    /// Like [`TestContext::new`] with a caller-supplied session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot bind or the client cannot be
    /// built.
    pub async fn with_sessions(
        sessions: SessionStore,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let backend = MockBackend::start().await?;
        let config = config_for(&backend);
        let view = Arc::new(RecordingView::new());

        let (dashboard, admin) = controllers(&config, sessions, &view)?;
        Ok(Self {
            backend,
            view,
            config,
            dashboard,
            admin,
        })
    }
}

/// Client configuration pointing at `backend`, with short delays.
#[must_use]
pub fn config_for(backend: &MockBackend) -> ClientConfig {
    ClientConfig {
        base_url: backend.url().clone(),
        session_file: PathBuf::from(".unused-session.json"),
        poll_interval: Duration::from_millis(100),
        stop_refresh_delay: Duration::from_millis(50),
        request_timeout: Some(Duration::from_secs(5)),
        log_format: LogFormat::Text,
    }
}

/// Build both controllers sharing one view.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn controllers(
    config: &ClientConfig,
    sessions: SessionStore,
    view: &Arc<RecordingView>,
) -> ClientResult<(Dashboard, AdminPanel)> {
    let api = ApiClient::from_config(config)?;
    let shared: Arc<dyn View> = Arc::<RecordingView>::clone(view);
    let dashboard = Dashboard::new(api.clone(), sessions, Arc::clone(&shared), config);
    let admin = AdminPanel::new(api, shared);
    Ok((dashboard, admin))
}
