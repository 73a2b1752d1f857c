//! HTTP transport and typed endpoints.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use visit_panel_core::{
    ExportTarget, History, Redeem, RedeemId, Settings, Task, TaskId, User, UserId,
};

use super::types::{Approval, LoginResponse, Registration, StartedTask};
use super::{expect_no_error, expect_ok, take_list};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Multipart form body sent by [`ApiClient::post`].
///
/// Field values are plain text; the backend reads every field with
/// `request.form`.
#[derive(Default)]
pub struct Form {
    fields: Vec<(&'static str, String)>,
}

impl Form {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    #[must_use]
    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    /// Field names in insertion order, for logging without values.
    fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }

    fn into_multipart(self) -> reqwest::multipart::Form {
        self.fields
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            })
    }
}

/// Visit Panel backend client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// No timeout is applied unless one is given.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// Create a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = self.inner.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    // =========================================================================
    // Generic helpers
    // =========================================================================

    /// POST a multipart form and parse the JSON response body.
    ///
    /// The HTTP status is not checked.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` on network failures and
    /// `ClientError::Parse` if the body is not JSON.
    #[instrument(skip(self, form), fields(fields = ?form.names()))]
    pub async fn post(&self, path: &str, form: Form) -> ClientResult<Value> {
        let url = self.url(path, &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .multipart(form.into_multipart())
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "POST response");

        Ok(serde_json::from_slice(&body)?)
    }

    /// GET `path` with query parameters and parse the JSON response body.
    ///
    /// The HTTP status is not checked.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` on network failures and
    /// `ClientError::Parse` if the body is not JSON.
    #[instrument(skip(self, query))]
    pub async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Value> {
        let url = self.url(path, query)?;
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "GET response");

        Ok(serde_json::from_slice(&body)?)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` unless the server answers `ok: true`.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &SecretString,
    ) -> ClientResult<Registration> {
        let form = Form::new()
            .field("username", username)
            .field("password", password.expose_secret());
        let payload = expect_ok(self.post("/api/register", form).await?)?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Exchange credentials for an access token and the user record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the payload carries no access token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> ClientResult<LoginResponse> {
        let form = Form::new()
            .field("username", username)
            .field("password", password.expose_secret());
        let payload = self.post("/api/login", form).await?;

        let has_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .is_some_and(|token| !token.is_empty());
        if !has_token {
            return Err(ClientError::Rejected(payload));
        }

        Ok(serde_json::from_value(payload)?)
    }

    /// Fetch the global economy settings.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` or `ClientError::Parse` on transport failures.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> ClientResult<Settings> {
        let payload = self.get_json("/api/settings", &[]).await?;
        Ok(serde_json::from_value(payload)?)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Start a visit task for `uid`. Coins are deducted by the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` unless the server answers `ok: true`.
    #[instrument(skip(self, token))]
    pub async fn start_task(
        &self,
        token: &SecretString,
        uid: &str,
        visits: i64,
    ) -> ClientResult<StartedTask> {
        let form = Form::new()
            .field("token", token.expose_secret())
            .field("uid", uid)
            .field("visits", visits.to_string());
        let payload = expect_ok(self.post("/api/tasks/start", form).await?)?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Ask the server to stop a running task.
    ///
    /// The worker notices the flag on its next poll, so the status changes
    /// some time after this returns.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` unless the server answers `ok: true`.
    #[instrument(skip(self, token))]
    pub async fn stop_task(&self, token: &SecretString, id: TaskId) -> ClientResult<()> {
        let form = Form::new().field("token", token.expose_secret());
        expect_ok(self.post(&format!("/api/tasks/{id}/stop"), form).await?)?;
        Ok(())
    }

    /// List the tasks of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the payload carries an `error` key.
    #[instrument(skip(self, token))]
    pub async fn tasks(&self, token: &SecretString) -> ClientResult<Vec<Task>> {
        let payload = self
            .get_json("/api/tasks", &[("token", token.expose_secret())])
            .await?;
        take_list(payload, "tasks")
    }

    /// Fetch one task, merged with live worker progress when available.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the payload carries an `error` key.
    #[instrument(skip(self, token))]
    pub async fn task(&self, token: &SecretString, id: TaskId) -> ClientResult<Task> {
        let payload = self
            .get_json(&format!("/api/tasks/{id}"), &[("token", token.expose_secret())])
            .await?;
        Ok(serde_json::from_value(expect_no_error(payload)?)?)
    }

    /// Audit trail and tasks of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the payload carries an `error` key.
    #[instrument(skip(self, token))]
    pub async fn history(&self, token: &SecretString) -> ClientResult<History> {
        let payload = self
            .get_json("/api/history", &[("token", token.expose_secret())])
            .await?;
        Ok(serde_json::from_value(expect_no_error(payload)?)?)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// List every user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the admin password is refused.
    #[instrument(skip(self, admin_pass))]
    pub async fn admin_users(&self, admin_pass: &SecretString) -> ClientResult<Vec<User>> {
        let payload = self
            .get_json("/api/admin/users", &[("admin_pass", admin_pass.expose_secret())])
            .await?;
        take_list(payload, "users")
    }

    /// Credit `coins` to a user. The amount is forwarded as entered.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` unless the server answers `ok: true`.
    #[instrument(skip(self, admin_pass))]
    pub async fn admin_add_coins(
        &self,
        admin_pass: &SecretString,
        user_id: UserId,
        coins: &str,
    ) -> ClientResult<()> {
        let form = Form::new()
            .field("admin_pass", admin_pass.expose_secret())
            .field("coins", coins);
        expect_ok(
            self.post(&format!("/api/admin/users/{user_id}/add_coins"), form)
                .await?,
        )?;
        Ok(())
    }

    /// List every redeem request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the admin password is refused.
    #[instrument(skip(self, admin_pass))]
    pub async fn admin_redeems(&self, admin_pass: &SecretString) -> ClientResult<Vec<Redeem>> {
        let payload = self
            .get_json("/api/admin/redeems", &[("admin_pass", admin_pass.expose_secret())])
            .await?;
        take_list(payload, "redeems")
    }

    /// Approve a pending redeem request and return the coins credited.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` unless the server answers `ok: true`;
    /// an already processed request answers `ok: false`.
    #[instrument(skip(self, admin_pass))]
    pub async fn admin_approve_redeem(
        &self,
        admin_pass: &SecretString,
        id: RedeemId,
    ) -> ClientResult<i64> {
        let form = Form::new().field("admin_pass", admin_pass.expose_secret());
        let payload = expect_ok(
            self.post(&format!("/api/admin/redeems/{id}/approve"), form)
                .await?,
        )?;
        let approval: Approval = serde_json::from_value(payload)?;
        Ok(approval.credited)
    }

    /// Audit trail, tasks and redeems of every user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the payload carries an `error` key.
    #[instrument(skip(self, admin_pass))]
    pub async fn admin_history(&self, admin_pass: &SecretString) -> ClientResult<History> {
        let payload = self
            .get_json("/api/history", &[("admin_pass", admin_pass.expose_secret())])
            .await?;
        Ok(serde_json::from_value(expect_no_error(payload)?)?)
    }

    /// Download a raw backend data file.
    ///
    /// This endpoint serves a file rather than JSON, so unlike the others the
    /// HTTP status decides success.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` with the status and body text when the
    /// server refuses the download.
    #[instrument(skip(self, admin_pass))]
    pub async fn admin_export(
        &self,
        admin_pass: &SecretString,
        target: ExportTarget,
    ) -> ClientResult<Vec<u8>> {
        let url = self.url(
            &format!("/export/{target}"),
            &[("admin_pass", admin_pass.expose_secret())],
        )?;
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::Rejected(serde_json::json!({
                "status": status.as_u16(),
                "error": text,
            })));
        }

        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "Export downloaded");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), None).unwrap()
    }

    #[test]
    fn test_url_encodes_query() {
        let api = client("http://127.0.0.1:8000");
        let url = api.url("/api/tasks", &[("token", "a b&c=d")]).unwrap();
        assert_eq!(url.path(), "/api/tasks");
        assert_eq!(url.query(), Some("token=a+b%26c%3Dd"));
    }

    #[test]
    fn test_url_without_query() {
        let api = client("http://127.0.0.1:8000/");
        let url = api.url("/api/tasks/7/stop", &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/tasks/7/stop");
    }

    #[test]
    fn test_form_field_names() {
        let form = Form::new().field("token", "secret").field("uid", "123");
        assert_eq!(form.names(), vec!["token", "uid"]);
    }

    #[test]
    fn test_debug_shows_base_url() {
        let api = client("http://127.0.0.1:8000");
        let debug = format!("{api:?}");
        assert!(debug.contains("127.0.0.1:8000"));
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<ApiClient>();
    }

    #[tokio::test]
    async fn test_export_truncated_error_body_is_an_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 4096];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 100\r\n\r\nshort")
                .await
                .unwrap();
        });

        let api = client(&format!("http://{addr}"));
        let result = api
            .admin_export(&SecretString::from("pw"), ExportTarget::Users)
            .await;

        assert!(matches!(result, Err(ClientError::Http(_))));
    }
}
