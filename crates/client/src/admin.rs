//! Admin panel controller.
//!
//! Admin endpoints authenticate with a shared password sent on every
//! request. There is no login call: [`AdminPanel::admin_login`] only checks
//! that both fields are filled in and returns an [`AdminSession`] that the
//! caller passes to each later operation. A wrong password surfaces on the
//! first load.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};
use visit_panel_core::{ExportTarget, History, Redeem, RedeemId, User, UserId};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::guard::InFlightGuard;
use crate::view::{Area, View, alert_on_error, audit_table, redeems_table, users_table};

/// Credentials held for the lifetime of an admin page.
#[derive(Clone)]
pub struct AdminSession {
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AdminSession {
    /// # Errors
    ///
    /// Returns `ClientError::MissingField` when either field is empty.
    pub fn new(username: impl Into<String>, password: SecretString) -> ClientResult<Self> {
        let username = username.into();
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(ClientError::MissingField("username/password"));
        }
        Ok(Self { username, password })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) const fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Controller for the admin panel.
#[derive(Clone)]
pub struct AdminPanel {
    inner: Arc<AdminPanelInner>,
}

struct AdminPanelInner {
    api: ApiClient,
    view: Arc<dyn View>,
    guard: InFlightGuard,
}

impl std::fmt::Debug for AdminPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminPanel")
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl AdminPanel {
    #[must_use]
    pub fn new(api: ApiClient, view: Arc<dyn View>) -> Self {
        Self {
            inner: Arc::new(AdminPanelInner {
                api,
                view,
                guard: InFlightGuard::new(),
            }),
        }
    }

    fn view(&self) -> &dyn View {
        self.inner.view.as_ref()
    }

    /// Open the panel: keep the credentials and load users and redeems.
    ///
    /// Load failures are alerted by the loads themselves and do not fail
    /// the login.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingField` when either field is empty.
    #[instrument(skip(self, password))]
    pub async fn admin_login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> ClientResult<AdminSession> {
        let session = alert_on_error(
            self.view(),
            AdminSession::new(username, password.clone()),
        )?;
        info!("Admin panel opened");

        if let Err(e) = self.load_users(&session).await {
            warn!(error = %e, "Initial user list load failed");
        }
        if let Err(e) = self.load_redeems(&session).await {
            warn!(error = %e, "Initial redeem list load failed");
        }
        Ok(session)
    }

    /// Fetch and render every user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the admin password is refused.
    #[instrument(skip_all)]
    pub async fn load_users(&self, session: &AdminSession) -> ClientResult<Vec<User>> {
        let result = self.inner.api.admin_users(session.password()).await;
        let users = alert_on_error(self.view(), result)?;
        self.view().render(Area::Users, &users_table(&users));
        Ok(users)
    }

    /// Ask how many coins to credit, then credit them.
    ///
    /// Returns `Ok(false)` when the prompt is cancelled or left empty.
    ///
    /// # Errors
    ///
    /// Returns whatever [`AdminPanel::add_coins`] returns.
    #[instrument(skip(self, session))]
    pub async fn prompt_add(&self, session: &AdminSession, user_id: UserId) -> ClientResult<bool> {
        let Some(coins) = self
            .view()
            .prompt("coins to add")
            .filter(|answer| !answer.is_empty())
        else {
            return Ok(false);
        };
        self.add_coins(session, user_id, &coins).await?;
        Ok(true)
    }

    /// Credit `coins` to a user and refresh the user list.
    ///
    /// The amount is sent exactly as entered; the server validates it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` when the server refuses.
    #[instrument(skip(self, session))]
    pub async fn add_coins(
        &self,
        session: &AdminSession,
        user_id: UserId,
        coins: &str,
    ) -> ClientResult<()> {
        let result = self
            .inner
            .api
            .admin_add_coins(session.password(), user_id, coins)
            .await;
        alert_on_error(self.view(), result)?;
        info!(admin = session.username(), %user_id, coins, "Coins added");
        self.view().alert("added");

        if let Err(e) = self.load_users(session).await {
            warn!(error = %e, "User list refresh after credit failed");
        }
        Ok(())
    }

    /// Fetch and render every redeem request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the admin password is refused.
    #[instrument(skip_all)]
    pub async fn load_redeems(&self, session: &AdminSession) -> ClientResult<Vec<Redeem>> {
        let result = self.inner.api.admin_redeems(session.password()).await;
        let redeems = alert_on_error(self.view(), result)?;
        self.view().render(Area::Redeems, &redeems_table(&redeems));
        Ok(redeems)
    }

    /// Approve a redeem request, then refresh redeems and users.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InFlight` without a request while an approval
    /// of the same redeem is outstanding, or `ClientError::Rejected` when
    /// the server refuses (including an already processed request).
    #[instrument(skip(self, session))]
    pub async fn approve_redeem(&self, session: &AdminSession, id: RedeemId) -> ClientResult<i64> {
        let key = format!("approve_redeem:{id}");
        let result = async {
            let _ticket = self
                .inner
                .guard
                .try_acquire(key.as_str())
                .ok_or_else(|| ClientError::InFlight(key.clone()))?;
            self.inner
                .api
                .admin_approve_redeem(session.password(), id)
                .await
        }
        .await;

        let credited = alert_on_error(self.view(), result)?;
        info!(admin = session.username(), redeem_id = %id, credited, "Redeem approved");
        self.view().alert(&format!("approved {credited} coins"));

        if let Err(e) = self.load_redeems(session).await {
            warn!(error = %e, "Redeem list refresh after approval failed");
        }
        if let Err(e) = self.load_users(session).await {
            warn!(error = %e, "User list refresh after approval failed");
        }
        Ok(credited)
    }

    /// Fetch and render the global audit trail.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the admin password is refused.
    #[instrument(skip_all)]
    pub async fn load_history(&self, session: &AdminSession) -> ClientResult<History> {
        let result = self.inner.api.admin_history(session.password()).await;
        let history = alert_on_error(self.view(), result)?;
        self.view().render(Area::History, &audit_table(&history.audit));
        Ok(history)
    }

    /// Download one of the backend's raw data files.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` with the status and body when the
    /// download is refused.
    #[instrument(skip(self, session))]
    pub async fn export(&self, session: &AdminSession, target: ExportTarget) -> ClientResult<Vec<u8>> {
        let result = self.inner.api.admin_export(session.password(), target).await;
        alert_on_error(self.view(), result)
    }
}
