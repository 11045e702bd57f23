mod common;

use axum::http::StatusCode;
use common::{location, text, TestApp};
use team_builder::models::Notification;

async fn seed(app: &TestApp, recipient: i64, actor: i64, verb: &str) -> i64 {
    let mut conn = app.service.database().acquire().await.unwrap();
    Notification::send(recipient, actor, verb, &mut conn)
        .await
        .unwrap();
    sqlx::query_scalar("SELECT MAX(pk) FROM notifications")
        .fetch_one(&mut *conn)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unread_counter_and_mark_read() {
    let mut app = TestApp::new().await;
    let actor = app.create_user("actor@example.com", "actor", false).await;
    let me = app.sign_in("me@example.com", "me").await;
    let pk = seed(&app, me.pk, actor.pk, "Hello there").await;

    let body = text(app.get("/notifications/unread").await).await;
    assert!(body.contains("Hello there"));
    assert!(body.contains("<span class=\"badge\">1</span>"));

    let response = app
        .post(&format!("/notifications/mark_read/{}", pk), &[])
        .await;
    assert_eq!(location(&response), "/notifications/unread");

    let body = text(app.get("/notifications/unread").await).await;
    assert!(!body.contains("Hello there"));
    let body = text(app.get("/notifications/read").await).await;
    assert!(body.contains("Hello there"));

    let response = app
        .post(&format!("/notifications/mark_unread/{}", pk), &[])
        .await;
    assert_eq!(location(&response), "/notifications/read");
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM notifications WHERE unread = 1")
            .await,
        1
    );
}

#[tokio::test]
async fn test_delete_notification() {
    let mut app = TestApp::new().await;
    let actor = app.create_user("actor@example.com", "actor", false).await;
    let me = app.sign_in("me@example.com", "me").await;
    let pk = seed(&app, me.pk, actor.pk, "Bye").await;

    let response = app
        .post(&format!("/notifications/deletion/{}", pk), &[])
        .await;

    assert_eq!(location(&response), "/notifications/deletion_view");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM notifications").await, 0);
}

#[tokio::test]
async fn test_notifications_of_other_users_are_not_found() {
    let mut app = TestApp::new().await;
    let actor = app.create_user("actor@example.com", "actor", false).await;
    let pk = seed(&app, actor.pk, actor.pk, "Private").await;
    app.sign_in("me@example.com", "me").await;

    for uri in [
        format!("/notifications/mark_read/{}", pk),
        format!("/notifications/mark_unread/{}", pk),
        format!("/notifications/deletion/{}", pk),
    ] {
        assert_eq!(app.post(&uri, &[]).await.status(), StatusCode::NOT_FOUND);
    }
    assert!(!text(app.get("/notifications/all").await)
        .await
        .contains("Private"));
    assert_eq!(app.scalar("SELECT COUNT(*) FROM notifications").await, 1);
}
