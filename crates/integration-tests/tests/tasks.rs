//! Integration tests for the coin calculator, tasks and background polling.
//!
//! Run with: cargo test -p visit-panel-integration-tests --test tasks

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use visit_panel_client::view::Cell;
use visit_panel_client::{Area, ClientError, Credentials, Session};
use visit_panel_core::{TaskId, TaskStatus, User};
use visit_panel_integration_tests::TestContext;

async fn logged_in(coins: i64) -> TestContext {
    let ctx = TestContext::new().await.unwrap();
    ctx.backend.add_user("alice", "pw", coins);
    ctx.dashboard
        .login(&Credentials::new("alice", "pw"))
        .await
        .unwrap();
    ctx.view.clear();
    ctx
}

// ============================================================================
// Coin calculator
// ============================================================================

#[tokio::test]
async fn test_coins_needed_rounds_up() {
    let ctx = TestContext::new().await.unwrap();
    ctx.backend.set_visits_per_coin(Some(500));

    assert_eq!(ctx.dashboard.compute_coins_needed(1001).await.unwrap(), 3);
    assert_eq!(ctx.dashboard.compute_coins_needed(1000).await.unwrap(), 2);
    assert_eq!(ctx.view.last_text(Area::CoinsNeeded).as_deref(), Some("2"));
}

#[tokio::test]
async fn test_coins_needed_defaults_to_thousand() {
    let ctx = TestContext::new().await.unwrap();

    assert_eq!(ctx.dashboard.compute_coins_needed(2500).await.unwrap(), 3);

    ctx.backend.set_visits_per_coin(Some(0));
    assert_eq!(ctx.dashboard.compute_coins_needed(1000).await.unwrap(), 1);
    assert_eq!(ctx.view.last_text(Area::CoinsNeeded).as_deref(), Some("1"));
}

// ============================================================================
// Start
// ============================================================================

#[tokio::test]
async fn test_start_task_sends_form_and_refreshes() {
    let ctx = logged_in(10).await;

    let started = ctx.dashboard.start_task("555", 2500).await.unwrap();

    assert_eq!(started.task_id, TaskId::new(1));
    assert_eq!(started.coins_used, Some(3));
    assert_eq!(ctx.view.alerts(), ["Started 1"]);

    let requests = ctx.backend.requests_to("/api/tasks/start");
    assert_eq!(requests.len(), 1);
    let form = &requests.first().unwrap().form;
    assert_eq!(form.get("token").map(String::as_str), Some("token-1"));
    assert_eq!(form.get("uid").map(String::as_str), Some("555"));
    assert_eq!(form.get("visits").map(String::as_str), Some("2500"));

    let table = ctx.view.last_render(Area::Tasks).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.cell(0, "status"), Some(&Cell::text("running")));
    assert_eq!(ctx.backend.coins_of(visit_panel_core::UserId::new(1)), Some(7));
}

#[tokio::test]
async fn test_start_task_invalid_input_sends_nothing() {
    let ctx = logged_in(10).await;
    let before = ctx.backend.request_count();

    let empty_uid = ctx.dashboard.start_task("", 100).await;
    let zero_visits = ctx.dashboard.start_task("555", 0).await;
    let negative_visits = ctx.dashboard.start_task("555", -5).await;

    assert!(matches!(empty_uid, Err(ClientError::MissingField(_))));
    assert!(matches!(zero_visits, Err(ClientError::MissingField(_))));
    assert!(matches!(negative_visits, Err(ClientError::MissingField(_))));
    assert_eq!(ctx.backend.request_count(), before);
    assert_eq!(ctx.view.alerts().len(), 3);
}

#[tokio::test]
async fn test_start_task_requires_login() {
    let ctx = TestContext::new().await.unwrap();

    let result = ctx.dashboard.start_task("555", 100).await;

    assert!(matches!(result, Err(ClientError::NotLoggedIn)));
    assert_eq!(ctx.view.alerts(), ["login"]);
    assert_eq!(ctx.backend.request_count(), 0);
}

#[tokio::test]
async fn test_start_task_insufficient_coins_alerts_payload() {
    let ctx = logged_in(1).await;

    let result = ctx.dashboard.start_task("555", 5000).await;

    assert!(matches!(result, Err(ClientError::Rejected(_))));
    assert_eq!(ctx.view.alerts(), [r#"{"error":"insufficient coins"}"#]);
    assert!(ctx.view.last_render(Area::Tasks).is_none());
}

#[tokio::test]
async fn test_double_start_sends_one_request() {
    let ctx = logged_in(10).await;
    ctx.backend.set_latency(Duration::from_millis(200));

    let (first, second) = tokio::join!(
        ctx.dashboard.start_task("555", 1000),
        ctx.dashboard.start_task("555", 1000),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(ClientError::InFlight(_))));
    assert_eq!(ctx.backend.requests_to("/api/tasks/start").len(), 1);

    // Released once the first request completes.
    ctx.backend.set_latency(Duration::ZERO);
    assert!(ctx.dashboard.start_task("555", 1000).await.is_ok());
    assert_eq!(ctx.backend.requests_to("/api/tasks/start").len(), 2);
}

// ============================================================================
// List, detail and history
// ============================================================================

#[tokio::test]
async fn test_load_tasks_without_token_makes_no_request() {
    let ctx = TestContext::new().await.unwrap();

    assert!(ctx.dashboard.load_tasks().await.unwrap().is_none());
    assert_eq!(ctx.backend.request_count(), 0);
    assert!(ctx.view.events().is_empty());
}

#[tokio::test]
async fn test_empty_task_list_renders_no_rows() {
    let ctx = logged_in(10).await;

    let tasks = ctx.dashboard.load_tasks().await.unwrap().unwrap();

    assert!(tasks.is_empty());
    let table = ctx.view.last_render(Area::Tasks).unwrap();
    assert!(table.is_empty());
    let labels: Vec<&str> = table.columns().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["ID", "UID", "Req", "Coins", "Status", "Gained", "Act"]);
}

fn save_expired_session(ctx: &TestContext) {
    let user: User = serde_json::from_value(serde_json::json!({
        "id": 1,
        "username": "ghost"
    }))
    .unwrap();
    ctx.dashboard
        .sessions()
        .save(&Session::new("expired", user))
        .unwrap();
}

#[tokio::test]
async fn test_rejected_token_renders_empty_list_quietly() {
    let ctx = TestContext::new().await.unwrap();
    save_expired_session(&ctx);

    let tasks = ctx.dashboard.load_tasks().await.unwrap().unwrap();

    assert!(tasks.is_empty());
    assert!(ctx.view.alerts().is_empty());
    assert!(ctx.view.last_render(Area::Tasks).unwrap().is_empty());
}

#[tokio::test]
async fn test_show_task_renders_live_detail() {
    let ctx = logged_in(10).await;
    let user_id = visit_panel_core::UserId::new(1);
    let id = ctx.backend.add_task(user_id, "777", 3000, "running");

    let task = ctx.dashboard.show_task(id).await.unwrap();

    assert_eq!(task.status, TaskStatus::Running);
    assert_eq!(task.requested, Some(3000));
    let table = ctx.view.last_render(Area::TaskDetail).unwrap();
    assert_eq!(table.cell(0, "uid"), Some(&Cell::text("777")));
    assert_eq!(table.cell(0, "gained"), Some(&Cell::text(0)));
}

#[tokio::test]
async fn test_show_unknown_task_alerts_payload() {
    let ctx = logged_in(10).await;

    let result = ctx.dashboard.show_task(TaskId::new(99)).await;

    assert!(result.is_err());
    assert_eq!(ctx.view.alerts(), [r#"{"error":"not found"}"#]);
}

#[tokio::test]
async fn test_history_renders_own_audit() {
    let ctx = TestContext::new().await.unwrap();
    ctx.dashboard
        .register(&Credentials::new("alice", "pw"))
        .await
        .unwrap();
    ctx.dashboard
        .login(&Credentials::new("alice", "pw"))
        .await
        .unwrap();
    ctx.dashboard.start_task("555", 1000).await.unwrap();

    let history = ctx.dashboard.load_history().await.unwrap();

    let actions: Vec<&str> = history.audit.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(actions, ["signup_bonus", "task_start"]);
    assert_eq!(history.tasks.len(), 1);
    assert_eq!(ctx.view.last_render(Area::History).unwrap().len(), 2);
}

// ============================================================================
// Stop
// ============================================================================

#[tokio::test]
async fn test_stop_task_refreshes_after_delay() {
    let ctx = logged_in(10).await;
    let id = ctx
        .backend
        .add_task(visit_panel_core::UserId::new(1), "555", 1000, "running");

    let refresh = ctx.dashboard.stop_task(id).await.unwrap();

    let stops = ctx.backend.requests_to(&format!("/api/tasks/{id}/stop"));
    assert_eq!(stops.len(), 1);
    assert_eq!(
        stops.first().unwrap().form.get("token").map(String::as_str),
        Some("token-1")
    );
    assert_eq!(ctx.view.alerts(), ["stop requested"]);
    assert!(ctx.backend.requests_to("/api/tasks").is_empty());

    refresh.await.unwrap();

    assert_eq!(ctx.backend.requests_to("/api/tasks").len(), 1);
    let table = ctx.view.last_render(Area::Tasks).unwrap();
    assert_eq!(table.cell(0, "status"), Some(&Cell::text("stopped")));
    assert_eq!(ctx.backend.task_status(id).as_deref(), Some("stopped"));
}

#[tokio::test]
async fn test_stop_foreign_task_alerts_payload() {
    let ctx = logged_in(10).await;
    let other = ctx.backend.add_user("bob", "pw", 0);
    let id = ctx.backend.add_task(other, "555", 1000, "running");

    let result = ctx.dashboard.stop_task(id).await;

    assert!(matches!(result, Err(ClientError::Rejected(_))));
    assert_eq!(ctx.view.alerts(), [r#"{"error":"forbidden"}"#]);
    assert_eq!(ctx.backend.task_status(id).as_deref(), Some("running"));
}

// ============================================================================
// Polling
// ============================================================================

#[tokio::test]
async fn test_boot_without_session_does_nothing() {
    let ctx = TestContext::new().await.unwrap();

    assert!(ctx.dashboard.boot().await.is_none());
    assert_eq!(ctx.backend.request_count(), 0);
}

#[tokio::test]
async fn test_boot_loads_tasks_then_polls() {
    let ctx = logged_in(10).await;

    let poller = ctx.dashboard.boot().await.unwrap();
    assert_eq!(ctx.backend.requests_to("/api/tasks").len(), 1);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(ctx.backend.requests_to("/api/tasks").len() >= 3);
    assert!(!poller.is_finished());
    poller.cancel();
}

#[tokio::test]
async fn test_polling_with_expired_token_never_alerts() {
    let ctx = TestContext::new().await.unwrap();
    save_expired_session(&ctx);

    let poller = ctx.dashboard.boot().await.unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;

    assert!(ctx.view.alerts().is_empty());
    assert!(ctx.view.renders(Area::Tasks).len() >= 2);
    assert!(ctx.view.renders(Area::Tasks).iter().all(|t| t.is_empty()));
    assert!(!poller.is_finished());
    poller.cancel();
}

#[tokio::test]
async fn test_poller_stops_after_logout() {
    let ctx = logged_in(10).await;
    let poller = ctx.dashboard.start_polling();

    tokio::time::sleep(Duration::from_millis(250)).await;
    ctx.dashboard.logout().unwrap();

    tokio::time::timeout(Duration::from_secs(2), poller.finished())
        .await
        .unwrap();
    let polled = ctx.backend.requests_to("/api/tasks").len();
    assert!(polled >= 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ctx.backend.requests_to("/api/tasks").len(), polled);
}

#[tokio::test]
async fn test_poller_stops_after_cancel() {
    let ctx = logged_in(10).await;
    let poller = ctx.dashboard.start_polling();

    tokio::time::sleep(Duration::from_millis(250)).await;
    poller.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let polled = ctx.backend.requests_to("/api/tasks").len();
    assert!(polled >= 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ctx.backend.requests_to("/api/tasks").len(), polled);
    assert!(ctx.dashboard.sessions().is_logged_in());
}
