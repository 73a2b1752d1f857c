//! Account and task commands.
//!
//! Each command builds a [`Dashboard`] over the on-disk session store, so a
//! login in one invocation is visible to the next.

use std::sync::Arc;

use tracing::info;
use visit_panel_client::{
    ApiClient, ClientConfig, ClientError, Credentials, Dashboard, SessionStore, View,
};
use visit_panel_core::TaskId;

use super::CliError;
use crate::view::TerminalView;

pub struct UserContext {
    dashboard: Dashboard,
    view: Arc<TerminalView>,
}

impl UserContext {
    pub fn new(config: &ClientConfig) -> Result<Self, CliError> {
        let api = ApiClient::from_config(config)?;
        let sessions = SessionStore::file(&config.session_file);
        let view = Arc::new(TerminalView);
        let shared: Arc<dyn View> = Arc::<TerminalView>::clone(&view);
        let dashboard = Dashboard::new(api, sessions, shared, config);
        Ok(Self { dashboard, view })
    }

    pub async fn register(&self, username: String, password: String) -> Result<(), CliError> {
        let registration = self
            .dashboard
            .register(&Credentials::new(username, password))
            .await?;
        if let Some(coins) = registration.coins {
            info!(coins, "Starting balance");
        }
        Ok(())
    }

    pub async fn login(&self, username: String, password: String) -> Result<(), CliError> {
        let session = self
            .dashboard
            .login(&Credentials::new(username, password))
            .await?;
        self.view.alert(&format!(
            "{} has {} coins",
            session.user.username, session.user.coins
        ));
        Ok(())
    }

    pub fn logout(&self) -> Result<(), CliError> {
        self.dashboard.logout()?;
        Ok(())
    }

    pub async fn coins(&self, visits: i64) -> Result<(), CliError> {
        self.dashboard.compute_coins_needed(visits).await?;
        Ok(())
    }

    pub async fn start(&self, uid: &str, visits: i64) -> Result<(), CliError> {
        self.dashboard.start_task(uid, visits).await?;
        Ok(())
    }

    /// Waits for the delayed refresh so its output is not lost on exit.
    pub async fn stop(&self, id: TaskId) -> Result<(), CliError> {
        let refresh = self.dashboard.stop_task(id).await?;
        refresh.await?;
        Ok(())
    }

    pub async fn tasks(&self) -> Result<(), CliError> {
        if self.dashboard.load_tasks().await?.is_none() {
            self.view.alert("login");
        }
        Ok(())
    }

    pub async fn task(&self, id: TaskId) -> Result<(), CliError> {
        self.dashboard.show_task(id).await?;
        Ok(())
    }

    pub async fn history(&self) -> Result<(), CliError> {
        self.dashboard.load_history().await?;
        Ok(())
    }

    /// Show the task list and keep refreshing it until Ctrl-C or logout.
    pub async fn watch(&self) -> Result<(), CliError> {
        let Some(poller) = self.dashboard.boot().await else {
            self.view.alert("login");
            return Err(ClientError::NotLoggedIn.into());
        };
        info!(period = ?poller.period(), "Watching tasks, Ctrl-C to stop");

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted");
            }
            () = poller.finished() => info!("Session ended"),
        }
        Ok(())
    }
}
