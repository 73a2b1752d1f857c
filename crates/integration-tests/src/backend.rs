//! In-memory Visit Panel backend served by axum.
//!
//! Implements every endpoint the client calls with the same envelope and
//! status codes as the real server, and records each request it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;
use visit_panel_core::{RedeemId, TaskId, UserId, coins_needed};

/// Password the backend accepts on admin endpoints.
pub const ADMIN_PASS: &str = "admin123";

const SIGNUP_BONUS: i64 = 10;
const RUPEE_PER_COIN: f64 = 5.0;

/// One request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct MockUser {
    id: i64,
    username: String,
    password: String,
    coins: i64,
    total_visits: Option<i64>,
    banned: bool,
}

impl MockUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "coins": self.coins,
            "total_visits": self.total_visits,
            "is_admin": false,
            "banned": self.banned,
        })
    }
}

#[derive(Debug, Clone)]
struct MockTask {
    id: i64,
    user_id: i64,
    uid: String,
    requested_visits: i64,
    coins_deducted: i64,
    status: String,
    start_successful: Option<i64>,
    last_successful: Option<i64>,
}

impl MockTask {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "user_id": self.user_id,
            "uid": self.uid,
            "requested_visits": self.requested_visits,
            "coins_deducted": self.coins_deducted,
            "status": self.status,
            "start_successful": self.start_successful,
            "last_successful": self.last_successful,
            "note": "",
        })
    }
}

#[derive(Debug, Clone)]
struct MockRedeem {
    id: i64,
    user_id: i64,
    amount: f64,
    code: String,
    status: String,
}

impl MockRedeem {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "user_id": self.user_id,
            "amount": self.amount,
            "code": self.code,
            "status": self.status,
        })
    }
}

#[derive(Debug, Default)]
struct Data {
    requests: Vec<RecordedRequest>,
    users: Vec<MockUser>,
    tokens: HashMap<String, i64>,
    tasks: Vec<MockTask>,
    redeems: Vec<MockRedeem>,
    audit: Vec<Value>,
    visits_per_coin: Option<i64>,
    latency: Duration,
}

impl Data {
    fn user_for_token(&self, query_or_form: &HashMap<String, String>) -> Option<i64> {
        let token = query_or_form.get("token")?;
        self.tokens.get(token).copied()
    }

    fn is_admin(params: &HashMap<String, String>) -> bool {
        params.get("admin_pass").map(String::as_str) == Some(ADMIN_PASS)
    }

    fn audit(&mut self, actor: &str, user_id: i64, action: &str, amount: i64, note: String) {
        let id = self.audit.len() + 1;
        self.audit.push(json!({
            "id": id,
            "actor": actor,
            "user_id": user_id,
            "action": action,
            "amount": amount,
            "note": note,
        }));
    }
}

type Shared = Arc<Mutex<Data>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Data> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running mock backend. The server stops when this is dropped.
#[derive(Debug)]
pub struct MockBackend {
    url: Url,
    shared: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let shared: Shared = Arc::new(Mutex::new(Data::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let url = Url::parse(&format!("http://{addr}")).map_err(std::io::Error::other)?;

        let app = router(Arc::clone(&shared));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self {
            url,
            shared,
            server,
        })
    }

    /// Origin of the running server.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Create a user directly and return its id.
    pub fn add_user(&self, username: &str, password: &str, coins: i64) -> UserId {
        let mut data = lock(&self.shared);
        let id = i64::try_from(data.users.len()).unwrap_or(i64::MAX) + 1;
        data.users.push(MockUser {
            id,
            username: username.to_string(),
            password: password.to_string(),
            coins,
            total_visits: Some(0),
            banned: false,
        });
        UserId::new(id)
    }

    /// Store a null visit counter for a user, as rows created before the
    /// column existed have.
    pub fn clear_visits(&self, user_id: UserId) {
        let mut data = lock(&self.shared);
        if let Some(user) = data.users.iter_mut().find(|u| u.id == user_id.as_i64()) {
            user.total_visits = None;
        }
    }

    /// Mark a user as banned so login is refused.
    pub fn ban(&self, user_id: UserId) {
        let mut data = lock(&self.shared);
        if let Some(user) = data.users.iter_mut().find(|u| u.id == user_id.as_i64()) {
            user.banned = true;
        }
    }

    /// Create a task directly, bypassing the coin check.
    pub fn add_task(&self, user_id: UserId, uid: &str, visits: i64, status: &str) -> TaskId {
        let mut data = lock(&self.shared);
        let id = i64::try_from(data.tasks.len()).unwrap_or(i64::MAX) + 1;
        data.tasks.push(MockTask {
            id,
            user_id: user_id.as_i64(),
            uid: uid.to_string(),
            requested_visits: visits,
            coins_deducted: coins_needed(visits, None),
            status: status.to_string(),
            start_successful: Some(100),
            last_successful: Some(100),
        });
        TaskId::new(id)
    }

    /// Create a pending redeem request.
    pub fn add_redeem(&self, user_id: UserId, amount: f64, code: &str) -> RedeemId {
        let mut data = lock(&self.shared);
        let id = i64::try_from(data.redeems.len()).unwrap_or(i64::MAX) + 1;
        data.redeems.push(MockRedeem {
            id,
            user_id: user_id.as_i64(),
            amount,
            code: code.to_string(),
            status: "pending".to_string(),
        });
        RedeemId::new(id)
    }

    /// Set `VISITS_PER_COIN`; `None` omits it from the settings payload.
    pub fn set_visits_per_coin(&self, rate: Option<i64>) {
        lock(&self.shared).visits_per_coin = rate;
    }

    /// Delay applied before answering task starts and redeem approvals.
    pub fn set_latency(&self, latency: Duration) {
        lock(&self.shared).latency = latency;
    }

    /// Current balance of a user.
    #[must_use]
    pub fn coins_of(&self, user_id: UserId) -> Option<i64> {
        lock(&self.shared)
            .users
            .iter()
            .find(|u| u.id == user_id.as_i64())
            .map(|u| u.coins)
    }

    /// Status of a task.
    #[must_use]
    pub fn task_status(&self, id: TaskId) -> Option<String> {
        lock(&self.shared)
            .tasks
            .iter()
            .find(|t| t.id == id.as_i64())
            .map(|t| t.status.clone())
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.shared).requests.clone()
    }

    /// Requests received for exactly `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        lock(&self.shared)
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.shared).requests.len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/api/settings", get(settings))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/tasks/start", post(start_task))
        .route("/api/tasks/{id}/stop", post(stop_task))
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/{id}", get(get_task))
        .route("/api/history", get(history))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/users/{id}/add_coins", post(admin_add_coins))
        .route("/api/admin/redeems", get(admin_redeems))
        .route("/api/admin/redeems/{id}/approve", post(admin_approve))
        .route("/export/{name}", get(export))
        .with_state(shared)
}

// =============================================================================
// Request helpers
// =============================================================================

async fn read_form(mut multipart: Multipart) -> HashMap<String, String> {
    let mut form = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap_or_default();
        form.insert(name, value);
    }
    form
}

fn record(
    shared: &Shared,
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
) {
    lock(shared).requests.push(RecordedRequest {
        method,
        path,
        query,
        form,
    });
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, axum::Json(body)).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "error": message }))
}

async fn latency(shared: &Shared) {
    let delay = lock(shared).latency;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn settings(State(shared): State<Shared>) -> Response {
    record(&shared, "GET", "/api/settings".into(), HashMap::new(), HashMap::new());
    let data = lock(&shared);
    let mut body = json!({
        "RUPEE_PER_COIN": RUPEE_PER_COIN,
        "SIGNUP_BONUS": SIGNUP_BONUS,
        "HIT_INTERVAL": 10,
    });
    if let (Some(rate), Some(map)) = (data.visits_per_coin, body.as_object_mut()) {
        map.insert("VISITS_PER_COIN".into(), json!(rate));
    }
    reply(StatusCode::OK, body)
}

async fn register(State(shared): State<Shared>, multipart: Multipart) -> Response {
    let form = read_form(multipart).await;
    record(&shared, "POST", "/api/register".into(), HashMap::new(), form.clone());

    let username = form.get("username").cloned().unwrap_or_default();
    let password = form.get("password").cloned().unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "username/password required");
    }

    let mut data = lock(&shared);
    if data.users.iter().any(|u| u.username == username) {
        return error(StatusCode::BAD_REQUEST, "username exists");
    }
    let id = i64::try_from(data.users.len()).unwrap_or(i64::MAX) + 1;
    data.users.push(MockUser {
        id,
        username,
        password,
        coins: SIGNUP_BONUS,
        total_visits: Some(0),
        banned: false,
    });
    data.audit("system", id, "signup_bonus", SIGNUP_BONUS, "signup".into());
    reply(StatusCode::OK, json!({ "ok": true, "user_id": id, "coins": SIGNUP_BONUS }))
}

async fn login(State(shared): State<Shared>, multipart: Multipart) -> Response {
    let form = read_form(multipart).await;
    record(&shared, "POST", "/api/login".into(), HashMap::new(), form.clone());

    let mut data = lock(&shared);
    let user = data
        .users
        .iter()
        .find(|u| {
            Some(&u.username) == form.get("username") && Some(&u.password) == form.get("password")
        })
        .cloned();
    let Some(user) = user else {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    };
    if user.banned {
        return error(StatusCode::FORBIDDEN, "banned");
    }

    let token = format!("token-{}", user.id);
    data.tokens.insert(token.clone(), user.id);
    reply(
        StatusCode::OK,
        json!({ "access_token": token, "user": user.to_json() }),
    )
}

async fn start_task(State(shared): State<Shared>, multipart: Multipart) -> Response {
    let form = read_form(multipart).await;
    record(&shared, "POST", "/api/tasks/start".into(), HashMap::new(), form.clone());
    latency(&shared).await;

    let mut data = lock(&shared);
    let Some(user_id) = data.user_for_token(&form) else {
        return error(StatusCode::UNAUTHORIZED, "auth required");
    };
    let uid = form.get("uid").cloned().unwrap_or_default();
    let visits: i64 = form
        .get("visits")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    let cost = coins_needed(visits, data.visits_per_coin);

    let Some(user) = data.users.iter_mut().find(|u| u.id == user_id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    if user.coins < cost {
        return error(StatusCode::BAD_REQUEST, "insufficient coins");
    }
    user.coins -= cost;

    let id = i64::try_from(data.tasks.len()).unwrap_or(i64::MAX) + 1;
    data.tasks.push(MockTask {
        id,
        user_id,
        uid,
        requested_visits: visits,
        coins_deducted: cost,
        status: "running".into(),
        start_successful: None,
        last_successful: None,
    });
    data.audit("user", user_id, "task_start", -cost, format!("task {id}"));
    reply(
        StatusCode::OK,
        json!({ "ok": true, "task_id": id, "coins_used": cost }),
    )
}

async fn stop_task(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let form = read_form(multipart).await;
    record(&shared, "POST", format!("/api/tasks/{id}/stop"), HashMap::new(), form.clone());

    let mut data = lock(&shared);
    let Some(user_id) = data.user_for_token(&form) else {
        return error(StatusCode::UNAUTHORIZED, "auth required");
    };
    let Some(task) = data.tasks.iter_mut().find(|t| t.id == id) else {
        return error(StatusCode::NOT_FOUND, "task not found");
    };
    if task.user_id != user_id {
        return error(StatusCode::FORBIDDEN, "forbidden");
    }
    task.status = "stopped".into();
    reply(StatusCode::OK, json!({ "ok": true }))
}

async fn list_tasks(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&shared, "GET", "/api/tasks".into(), query.clone(), HashMap::new());

    let data = lock(&shared);
    let Some(user_id) = data.user_for_token(&query) else {
        return error(StatusCode::UNAUTHORIZED, "auth required");
    };
    let tasks: Vec<Value> = data
        .tasks
        .iter()
        .filter(|t| t.user_id == user_id)
        .map(MockTask::to_json)
        .collect();
    reply(StatusCode::OK, json!({ "tasks": tasks }))
}

async fn get_task(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&shared, "GET", format!("/api/tasks/{id}"), query.clone(), HashMap::new());

    let data = lock(&shared);
    let Some(user_id) = data.user_for_token(&query) else {
        return error(StatusCode::UNAUTHORIZED, "auth required");
    };
    let Some(task) = data.tasks.iter().find(|t| t.id == id) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    if task.user_id != user_id {
        return error(StatusCode::FORBIDDEN, "forbidden");
    }

    let mut body = task.to_json();
    if task.status == "running"
        && let Some(map) = body.as_object_mut()
    {
        map.insert("requested".into(), json!(task.requested_visits));
    }
    reply(StatusCode::OK, body)
}

async fn history(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&shared, "GET", "/api/history".into(), query.clone(), HashMap::new());

    let data = lock(&shared);
    if Data::is_admin(&query) {
        let tasks: Vec<Value> = data.tasks.iter().map(MockTask::to_json).collect();
        let redeems: Vec<Value> = data.redeems.iter().map(MockRedeem::to_json).collect();
        return reply(
            StatusCode::OK,
            json!({ "audit": data.audit, "tasks": tasks, "redeems": redeems }),
        );
    }

    let Some(user_id) = data.user_for_token(&query) else {
        return error(StatusCode::UNAUTHORIZED, "auth required");
    };
    let audit: Vec<&Value> = data
        .audit
        .iter()
        .filter(|a| a.get("user_id").and_then(Value::as_i64) == Some(user_id))
        .collect();
    let tasks: Vec<Value> = data
        .tasks
        .iter()
        .filter(|t| t.user_id == user_id)
        .map(MockTask::to_json)
        .collect();
    reply(StatusCode::OK, json!({ "audit": audit, "tasks": tasks }))
}

async fn admin_users(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&shared, "GET", "/api/admin/users".into(), query.clone(), HashMap::new());

    if !Data::is_admin(&query) {
        return error(StatusCode::UNAUTHORIZED, "admin auth failed");
    }
    let data = lock(&shared);
    let users: Vec<Value> = data.users.iter().map(MockUser::to_json).collect();
    reply(StatusCode::OK, json!({ "users": users }))
}

async fn admin_add_coins(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let form = read_form(multipart).await;
    record(
        &shared,
        "POST",
        format!("/api/admin/users/{id}/add_coins"),
        HashMap::new(),
        form.clone(),
    );

    if !Data::is_admin(&form) {
        return error(StatusCode::UNAUTHORIZED, "admin auth failed");
    }
    let Some(coins) = form.get("coins").and_then(|c| c.trim().parse::<i64>().ok()) else {
        return error(StatusCode::BAD_REQUEST, "invalid coins");
    };

    let mut data = lock(&shared);
    let Some(user) = data.users.iter_mut().find(|u| u.id == id) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    user.coins += coins;
    data.audit("admin", id, "add_coins", coins, "manual credit".into());
    reply(StatusCode::OK, json!({ "ok": true }))
}

async fn admin_redeems(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&shared, "GET", "/api/admin/redeems".into(), query.clone(), HashMap::new());

    if !Data::is_admin(&query) {
        return error(StatusCode::UNAUTHORIZED, "admin auth failed");
    }
    let data = lock(&shared);
    let redeems: Vec<Value> = data.redeems.iter().map(MockRedeem::to_json).collect();
    reply(StatusCode::OK, json!({ "redeems": redeems }))
}

async fn admin_approve(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let form = read_form(multipart).await;
    record(
        &shared,
        "POST",
        format!("/api/admin/redeems/{id}/approve"),
        HashMap::new(),
        form.clone(),
    );
    latency(&shared).await;

    if !Data::is_admin(&form) {
        return error(StatusCode::UNAUTHORIZED, "admin auth failed");
    }

    let mut data = lock(&shared);
    let Some(redeem) = data.redeems.iter_mut().find(|r| r.id == id) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    if redeem.status != "pending" {
        return reply(StatusCode::OK, json!({ "ok": false, "msg": "already processed" }));
    }
    redeem.status = "approved".into();
    #[allow(clippy::cast_possible_truncation)]
    let credited = (redeem.amount / RUPEE_PER_COIN).floor() as i64;
    let user_id = redeem.user_id;

    if let Some(user) = data.users.iter_mut().find(|u| u.id == user_id) {
        user.coins += credited;
    }
    data.audit("admin", user_id, "redeem_approved", credited, format!("redeem {id}"));
    reply(StatusCode::OK, json!({ "ok": true, "credited": credited }))
}

async fn export(
    State(shared): State<Shared>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&shared, "GET", format!("/export/{name}"), query.clone(), HashMap::new());

    if !Data::is_admin(&query) {
        return (StatusCode::UNAUTHORIZED, "admin auth required").into_response();
    }

    let data = lock(&shared);
    let body = match name.as_str() {
        "users" => json!(data.users.iter().map(MockUser::to_json).collect::<Vec<_>>()),
        "tasks" => json!(data.tasks.iter().map(MockTask::to_json).collect::<Vec<_>>()),
        "redeems" => json!(data.redeems.iter().map(MockRedeem::to_json).collect::<Vec<_>>()),
        "audit" => json!(data.audit),
        "settings" => json!({ "VISITS_PER_COIN": data.visits_per_coin }),
        _ => return (StatusCode::NOT_FOUND, "not found").into_response(),
    };
    (StatusCode::OK, body.to_string()).into_response()
}
