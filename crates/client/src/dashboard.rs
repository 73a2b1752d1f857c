//! User dashboard controller.
//!
//! [`Dashboard`] drives the logged-in user's pages: registration and login,
//! the coin calculator, starting and stopping tasks, and the task list with
//! its background refresh.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use visit_panel_core::{History, Task, TaskId};

use crate::api::{ApiClient, Registration, StartedTask};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::guard::InFlightGuard;
use crate::poller::PollHandle;
use crate::session::{Session, SessionStore};
use crate::view::{Area, Route, View, alert_on_error, audit_table, task_detail_table, tasks_table};

const START_TASK_KEY: &str = "start_task";

/// Username and password entered on the login or registration form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    fn check(&self) -> ClientResult<()> {
        if self.username.is_empty() || self.password.expose_secret().is_empty() {
            return Err(ClientError::MissingField("username/password"));
        }
        Ok(())
    }
}

/// Controller for the user dashboard.
///
/// Cheap to clone; clones share the session store, view and in-flight
/// guard, so a scheduled refresh sees the same state as the caller.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    api: ApiClient,
    sessions: SessionStore,
    view: Arc<dyn View>,
    guard: InFlightGuard,
    poll_interval: Duration,
    stop_refresh_delay: Duration,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("api", &self.inner.api)
            .field("poll_interval", &self.inner.poll_interval)
            .field("stop_refresh_delay", &self.inner.stop_refresh_delay)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    #[must_use]
    pub fn new(
        api: ApiClient,
        sessions: SessionStore,
        view: Arc<dyn View>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(DashboardInner {
                api,
                sessions,
                view,
                guard: InFlightGuard::new(),
                poll_interval: config.poll_interval,
                stop_refresh_delay: config.stop_refresh_delay,
            }),
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    fn view(&self) -> &dyn View {
        self.inner.view.as_ref()
    }

    fn require_token(&self) -> ClientResult<SecretString> {
        self.inner.sessions.token()?.ok_or(ClientError::NotLoggedIn)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Create an account. Alerts "registered" on success.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingField` without a request when either
    /// field is empty, or `ClientError::Rejected` with the server payload.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn register(&self, credentials: &Credentials) -> ClientResult<Registration> {
        let result = async {
            credentials.check()?;
            self.inner
                .api
                .register(&credentials.username, &credentials.password)
                .await
        }
        .await;

        let registration = alert_on_error(self.view(), result)?;
        self.view().alert("registered");
        Ok(registration)
    }

    /// Log in, persist the session and go to the home page.
    ///
    /// Nothing is persisted when the server refuses the credentials.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingField` without a request when either
    /// field is empty, `ClientError::Rejected` when no token comes back, or
    /// `ClientError::Storage` if the session cannot be saved.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        let result = async {
            credentials.check()?;
            let response = self
                .inner
                .api
                .login(&credentials.username, &credentials.password)
                .await?;
            let session = Session::new(response.access_token, response.user);
            self.inner.sessions.save(&session)?;
            Ok(session)
        }
        .await;

        let session = alert_on_error(self.view(), result)?;
        info!(user_id = %session.user.id, "Logged in");
        self.view().alert("login ok");
        self.view().navigate(Route::Home);
        Ok(session)
    }

    /// Forget the stored session and go home. Makes no request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be written.
    #[instrument(skip(self))]
    pub fn logout(&self) -> ClientResult<()> {
        self.inner.sessions.clear()?;
        info!("Logged out");
        self.view().navigate(Route::Home);
        Ok(())
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Show and return the coins a task of `visits` would cost.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` or `ClientError::Parse` if the settings
    /// cannot be fetched.
    #[instrument(skip(self))]
    pub async fn compute_coins_needed(&self, visits: i64) -> ClientResult<i64> {
        let settings = self.inner.api.settings().await?;
        let coins = settings.coins_for(visits);
        self.view().set_text(Area::CoinsNeeded, &coins.to_string());
        Ok(coins)
    }

    /// Start a task and refresh the task list.
    ///
    /// A second call made while the first is still outstanding is refused
    /// without a request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn`, `ClientError::MissingField` or
    /// `ClientError::InFlight` without a request, or `ClientError::Rejected`
    /// when the server refuses (for example on insufficient coins).
    #[instrument(skip(self))]
    pub async fn start_task(&self, uid: &str, visits: i64) -> ClientResult<StartedTask> {
        let result = async {
            let token = self.require_token()?;
            if uid.is_empty() || visits <= 0 {
                return Err(ClientError::MissingField("uid/visits"));
            }
            let _ticket = self
                .inner
                .guard
                .try_acquire(START_TASK_KEY)
                .ok_or_else(|| ClientError::InFlight(START_TASK_KEY.to_string()))?;
            self.inner.api.start_task(&token, uid, visits).await
        }
        .await;

        let started = alert_on_error(self.view(), result)?;
        info!(task_id = %started.task_id, coins_used = ?started.coins_used, "Task started");
        self.view().alert(&format!("Started {}", started.task_id));

        if let Err(e) = self.load_tasks().await {
            warn!(error = %e, "Task list refresh after start failed");
        }
        Ok(started)
    }

    /// Request a stop and schedule a task list refresh.
    ///
    /// The returned handle completes once the delayed refresh has run.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a request, or
    /// `ClientError::Rejected` when the server refuses.
    #[instrument(skip(self))]
    pub async fn stop_task(&self, id: TaskId) -> ClientResult<JoinHandle<()>> {
        let result = async {
            let token = self.require_token()?;
            self.inner.api.stop_task(&token, id).await
        }
        .await;

        alert_on_error(self.view(), result)?;
        self.view().alert("stop requested");

        let dashboard = self.clone();
        let delay = self.inner.stop_refresh_delay;
        Ok(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = dashboard.load_tasks().await {
                warn!(error = %e, "Task list refresh after stop failed");
            }
        }))
    }

    /// Fetch and render the task list.
    ///
    /// Returns `Ok(None)` without any request when no token is stored. A
    /// refused token renders an empty list and raises no alert, since this
    /// runs on every poll tick.
    ///
    /// # Errors
    ///
    /// Returns transport and local storage errors only.
    #[instrument(level = "debug", skip(self))]
    pub async fn load_tasks(&self) -> ClientResult<Option<Vec<Task>>> {
        let Some(token) = self.inner.sessions.token()? else {
            debug!("No session, skipping task list");
            return Ok(None);
        };

        let tasks = match self.inner.api.tasks(&token).await {
            Ok(tasks) => tasks,
            Err(ClientError::Rejected(payload)) => {
                warn!(%payload, "Task list refused");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        self.view().render(Area::Tasks, &tasks_table(&tasks));
        Ok(Some(tasks))
    }

    /// Fetch one task with its live progress and render it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a request, or
    /// `ClientError::Rejected` for an unknown task.
    #[instrument(skip(self))]
    pub async fn show_task(&self, id: TaskId) -> ClientResult<Task> {
        let result = async {
            let token = self.require_token()?;
            self.inner.api.task(&token, id).await
        }
        .await;

        let task = alert_on_error(self.view(), result)?;
        self.view().render(Area::TaskDetail, &task_detail_table(&task));
        Ok(task)
    }

    /// Fetch and render the user's audit trail.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a request, or
    /// `ClientError::Rejected` if the server refuses the token.
    #[instrument(skip(self))]
    pub async fn load_history(&self) -> ClientResult<History> {
        let result = async {
            let token = self.require_token()?;
            self.inner.api.history(&token).await
        }
        .await;

        let history = alert_on_error(self.view(), result)?;
        self.view().render(Area::History, &audit_table(&history.audit));
        Ok(history)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Page load: when a session is stored, show the task list and keep it
    /// fresh in the background.
    pub async fn boot(&self) -> Option<PollHandle> {
        if !self.inner.sessions.is_logged_in() {
            return None;
        }
        if let Err(e) = self.load_tasks().await {
            warn!(error = %e, "Initial task list load failed");
        }
        Some(self.start_polling())
    }

    /// Reload the task list every poll interval until logout or cancel.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start_polling(&self) -> PollHandle {
        let dashboard = self.clone();
        PollHandle::spawn(self.inner.poll_interval, move || {
            let dashboard = dashboard.clone();
            async move {
                match dashboard.load_tasks().await {
                    Ok(Some(_)) => ControlFlow::Continue(()),
                    Ok(None) => {
                        debug!("Session ended, polling stopped");
                        ControlFlow::Break(())
                    }
                    Err(e) => {
                        warn!(error = %e, "Background task refresh failed");
                        ControlFlow::Continue(())
                    }
                }
            }
        })
    }
}
