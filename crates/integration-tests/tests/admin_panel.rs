//! Integration tests for the admin panel.
//!
//! Run with: cargo test -p visit-panel-integration-tests --test admin_panel

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use visit_panel_client::view::Cell;
use visit_panel_client::{AdminSession, Area, ClientError};
use visit_panel_core::{ExportTarget, UserId};
use visit_panel_integration_tests::{ADMIN_PASS, TestContext};

fn session() -> AdminSession {
    AdminSession::new("admin", SecretString::from(ADMIN_PASS)).unwrap()
}

fn wrong_session() -> AdminSession {
    AdminSession::new("admin", SecretString::from("guess")).unwrap()
}

// ============================================================================
// Login and lists
// ============================================================================

#[tokio::test]
async fn test_admin_login_loads_users_and_redeems() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 12);
    ctx.backend.add_user("bob", "pw", 3);
    ctx.backend.add_redeem(alice, 50.0, "GIFT-1");

    let session = ctx
        .admin
        .admin_login("admin", &SecretString::from(ADMIN_PASS))
        .await
        .unwrap();

    assert_eq!(session.username(), "admin");
    assert!(ctx.view.alerts().is_empty());

    let users = ctx.view.last_render(Area::Users).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users.cell(0, "username"), Some(&Cell::text("alice")));
    assert_eq!(users.cell(0, "coins"), Some(&Cell::text(12)));

    let redeems = ctx.view.last_render(Area::Redeems).unwrap();
    assert_eq!(redeems.len(), 1);
    assert_eq!(redeems.cell(0, "code"), Some(&Cell::text("GIFT-1")));

    let request = ctx.backend.requests_to("/api/admin/users");
    assert_eq!(
        request.first().unwrap().query.get("admin_pass").map(String::as_str),
        Some(ADMIN_PASS)
    );
}

#[tokio::test]
async fn test_user_list_tolerates_null_visits() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 12);
    ctx.backend.clear_visits(alice);

    let users = ctx.admin.load_users(&session()).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users.first().unwrap().total_visits, None);
    assert!(ctx.view.alerts().is_empty());
    let table = ctx.view.last_render(Area::Users).unwrap();
    assert_eq!(table.cell(0, "visits"), Some(&Cell::text(0)));
}

#[tokio::test]
async fn test_admin_login_wrong_password_surfaces_on_load() {
    let ctx = TestContext::new().await.unwrap();

    let session = ctx
        .admin
        .admin_login("admin", &SecretString::from("guess"))
        .await;

    assert!(session.is_ok());
    assert_eq!(
        ctx.view.alerts(),
        [
            r#"{"error":"admin auth failed"}"#,
            r#"{"error":"admin auth failed"}"#
        ]
    );
    assert!(ctx.view.last_render(Area::Users).is_none());
}

#[tokio::test]
async fn test_admin_login_empty_fields_sends_nothing() {
    let ctx = TestContext::new().await.unwrap();

    let result = ctx
        .admin
        .admin_login("admin", &SecretString::from(String::new()))
        .await;

    assert!(matches!(result, Err(ClientError::MissingField(_))));
    assert_eq!(ctx.backend.request_count(), 0);
}

// ============================================================================
// Coin credits
// ============================================================================

#[tokio::test]
async fn test_add_coins_credits_and_refreshes() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 10);

    ctx.admin.add_coins(&session(), alice, "25").await.unwrap();

    assert_eq!(ctx.view.alerts(), ["added"]);
    assert_eq!(ctx.backend.coins_of(alice), Some(35));
    let users = ctx.view.last_render(Area::Users).unwrap();
    assert_eq!(users.cell(0, "coins"), Some(&Cell::text(35)));

    let request = ctx
        .backend
        .requests_to(&format!("/api/admin/users/{alice}/add_coins"));
    let form = &request.first().unwrap().form;
    assert_eq!(form.get("coins").map(String::as_str), Some("25"));
    assert_eq!(form.get("admin_pass").map(String::as_str), Some(ADMIN_PASS));
}

#[tokio::test]
async fn test_add_coins_forwards_amount_unvalidated() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 10);

    let result = ctx.admin.add_coins(&session(), alice, "lots").await;

    assert!(matches!(result, Err(ClientError::Rejected(_))));
    assert_eq!(ctx.view.alerts(), [r#"{"error":"invalid coins"}"#]);
    let request = ctx
        .backend
        .requests_to(&format!("/api/admin/users/{alice}/add_coins"));
    assert_eq!(
        request.first().unwrap().form.get("coins").map(String::as_str),
        Some("lots")
    );
    assert_eq!(ctx.backend.coins_of(alice), Some(10));
}

#[tokio::test]
async fn test_prompt_add_uses_answer() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 10);
    ctx.view.answer_next(Some("5"));

    let added = ctx.admin.prompt_add(&session(), alice).await.unwrap();

    assert!(added);
    assert_eq!(ctx.view.prompts(), ["coins to add"]);
    assert_eq!(ctx.backend.coins_of(alice), Some(15));
}

#[tokio::test]
async fn test_prompt_add_cancel_sends_nothing() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 10);
    ctx.view.answer_next(None);
    ctx.view.answer_next(Some(""));

    assert!(!ctx.admin.prompt_add(&session(), alice).await.unwrap());
    assert!(!ctx.admin.prompt_add(&session(), alice).await.unwrap());

    assert_eq!(ctx.backend.request_count(), 0);
    assert!(ctx.view.alerts().is_empty());
}

// ============================================================================
// Redeems
// ============================================================================

#[tokio::test]
async fn test_approve_redeem_credits_and_refreshes() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 0);
    let id = ctx.backend.add_redeem(alice, 50.0, "GIFT-1");

    let credited = ctx.admin.approve_redeem(&session(), id).await.unwrap();

    assert_eq!(credited, 10);
    assert_eq!(ctx.view.alerts(), ["approved 10 coins"]);
    assert_eq!(ctx.backend.coins_of(alice), Some(10));

    let redeems = ctx.view.last_render(Area::Redeems).unwrap();
    assert_eq!(redeems.cell(0, "status"), Some(&Cell::text("approved")));
    let users = ctx.view.last_render(Area::Users).unwrap();
    assert_eq!(users.cell(0, "coins"), Some(&Cell::text(10)));
}

#[tokio::test]
async fn test_approve_twice_reports_already_processed() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 0);
    let id = ctx.backend.add_redeem(alice, 50.0, "GIFT-1");
    ctx.admin.approve_redeem(&session(), id).await.unwrap();
    ctx.view.clear();

    let result = ctx.admin.approve_redeem(&session(), id).await;

    assert!(matches!(result, Err(ClientError::Rejected(_))));
    assert_eq!(
        ctx.view.alerts(),
        [r#"{"msg":"already processed","ok":false}"#]
    );
    assert_eq!(ctx.backend.coins_of(alice), Some(10));
}

#[tokio::test]
async fn test_concurrent_approve_sends_one_request() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 0);
    let id = ctx.backend.add_redeem(alice, 50.0, "GIFT-1");
    ctx.backend.set_latency(Duration::from_millis(200));
    let session = session();

    let (first, second) = tokio::join!(
        ctx.admin.approve_redeem(&session, id),
        ctx.admin.approve_redeem(&session, id),
    );

    assert_eq!(first.unwrap(), 10);
    assert!(matches!(second, Err(ClientError::InFlight(_))));
    assert_eq!(
        ctx.backend
            .requests_to(&format!("/api/admin/redeems/{id}/approve"))
            .len(),
        1
    );
    assert_eq!(ctx.backend.coins_of(alice), Some(10));
}

#[tokio::test]
async fn test_wrong_password_approve_alerts_payload() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 0);
    let id = ctx.backend.add_redeem(alice, 50.0, "GIFT-1");

    let result = ctx.admin.approve_redeem(&wrong_session(), id).await;

    assert!(result.is_err());
    assert_eq!(ctx.view.alerts(), [r#"{"error":"admin auth failed"}"#]);
    assert_eq!(ctx.backend.coins_of(alice), Some(0));
}

// ============================================================================
// History and exports
// ============================================================================

#[tokio::test]
async fn test_admin_history_covers_all_users() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.backend.add_user("alice", "pw", 0);
    let bob = ctx.backend.add_user("bob", "pw", 0);
    ctx.admin.add_coins(&session(), alice, "5").await.unwrap();
    ctx.admin.add_coins(&session(), bob, "7").await.unwrap();
    ctx.backend.add_redeem(bob, 10.0, "GIFT-2");

    let history = ctx.admin.load_history(&session()).await.unwrap();

    let users: Vec<Option<UserId>> = history.audit.iter().map(|a| a.user_id).collect();
    assert_eq!(users, [Some(alice), Some(bob)]);
    assert_eq!(history.redeems.len(), 1);
    assert_eq!(ctx.view.last_render(Area::History).unwrap().len(), 2);
}

#[tokio::test]
async fn test_export_returns_raw_file() {
    let ctx = TestContext::new().await.unwrap();
    ctx.backend.add_user("alice", "pw", 0);
    ctx.backend.add_user("bob", "pw", 0);

    let bytes = ctx
        .admin
        .export(&session(), ExportTarget::Users)
        .await
        .unwrap();

    let users: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(ctx.backend.requests_to("/export/users").len(), 1);
}

#[tokio::test]
async fn test_export_wrong_password_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let result = ctx.admin.export(&wrong_session(), ExportTarget::Audit).await;

    let Err(ClientError::Rejected(payload)) = result else {
        panic!("expected a rejection");
    };
    assert_eq!(payload["status"], 401);
    assert_eq!(payload["error"], "admin auth required");
    assert_eq!(ctx.view.alerts().len(), 1);
}
