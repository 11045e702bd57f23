mod common;

use axum::http::StatusCode;
use common::{location, text, TestApp};

async fn request_skill(app: &mut TestApp, skill: &str) {
    let response = app
        .post_multipart(
            "/profile/edit",
            &[
                ("username", "dev"),
                ("bio", ""),
                ("color", "#4A90E2"),
                ("new_skill", skill),
            ],
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_non_staff_cannot_reach_administrative() {
    let mut app = TestApp::new().await;
    app.sign_in("dev@example.com", "dev").await;

    let response = app.get("/administrative").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accepting_a_skill_request() {
    let mut app = TestApp::new().await;
    let dev = app.sign_in("dev@example.com", "dev").await;
    request_skill(&mut app, "Rust Developer").await;
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM skill_confirmations WHERE pending = 1")
            .await,
        1
    );
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM skills WHERE name = 'Rust Developer'")
            .await,
        0
    );
    app.logout().await;

    app.create_user("staff@example.com", "staff", true).await;
    app.login("staff@example.com").await;
    let body = text(app.get("/administrative").await).await;
    assert!(body.contains("Rust Developer"));

    let confirmation_pk = app.scalar("SELECT pk FROM skill_confirmations").await;
    let response = app
        .post(
            &format!("/administrative/skill_accept/{}", confirmation_pk),
            &[],
        )
        .await;

    assert_eq!(location(&response), "/administrative");
    let skill_pk = app
        .scalar("SELECT pk FROM skills WHERE name = 'Rust Developer'")
        .await;
    assert_eq!(
        app.scalar(&format!(
            "SELECT COUNT(*) FROM all_skills WHERE user_pk = {} AND skill_pk = {}",
            dev.pk, skill_pk
        ))
        .await,
        1
    );
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM notifications WHERE verb = 'Your skill request has been accepted: Rust Developer'")
            .await,
        1
    );
    assert!(text(app.get("/administrative/non_pending").await)
        .await
        .contains("Accepted"));

    // Resolved requests can not be resolved again.
    let response = app
        .post(
            &format!("/administrative/skill_deny/{}", confirmation_pk),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_denying_a_skill_request() {
    let mut app = TestApp::new().await;
    app.sign_in("dev@example.com", "dev").await;
    request_skill(&mut app, "Cobol Developer").await;
    app.logout().await;

    app.create_user("staff@example.com", "staff", true).await;
    app.login("staff@example.com").await;
    let confirmation_pk = app.scalar("SELECT pk FROM skill_confirmations").await;
    app.post(
        &format!("/administrative/skill_deny/{}", confirmation_pk),
        &[],
    )
    .await;

    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM skills WHERE name = 'Cobol Developer'")
            .await,
        0
    );
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM skill_confirmations WHERE pending = 0 AND accepted = 0")
            .await,
        1
    );
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM notifications WHERE verb = 'Your skill request has been denied: Cobol Developer'")
            .await,
        1
    );
}
