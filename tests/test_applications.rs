mod common;

use axum::http::StatusCode;
use common::{location, text, TestApp};

/// Owner creates "Rocket" with one Python position. Returns (project_pk, position_pk).
async fn project_with_position(app: &mut TestApp) -> (i64, i64) {
    app.sign_in("owner@example.com", "owner").await;
    app.post(
        "/project/new",
        &[
            ("title", "Rocket"),
            ("description", "Going up"),
            ("time_line", "Soon"),
            ("requirements", "None"),
            ("form-TOTAL_FORMS", "1"),
            ("form-0-skill", "6"),
            ("form-0-information", "Backend work"),
            ("form-0-time_commitment", ""),
        ],
    )
    .await;
    app.logout().await;
    (
        app.scalar("SELECT pk FROM projects").await,
        app.scalar("SELECT pk FROM positions").await,
    )
}

#[tokio::test]
async fn test_apply_notifies_owner() {
    let mut app = TestApp::new().await;
    let (project_pk, position_pk) = project_with_position(&mut app).await;
    app.sign_in("dev@example.com", "dev").await;

    let response = app
        .post(&format!("/applications/request/{}", position_pk), &[])
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/project/view/{}", project_pk));
    assert_eq!(app.scalar("SELECT COUNT(*) FROM applicants").await, 1);
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM positions WHERE any_applicants = 1").await,
        1
    );
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM notifications WHERE verb = 'There is a pending application for the project: Rocket'")
            .await,
        1
    );
    assert!(text(app.get(&format!("/project/view/{}", project_pk)).await)
        .await
        .contains("Application sent"));
}

#[tokio::test]
async fn test_cannot_apply_twice_or_to_own_position() {
    let mut app = TestApp::new().await;
    let (_, position_pk) = project_with_position(&mut app).await;
    let uri = format!("/applications/request/{}", position_pk);

    app.login("owner@example.com").await;
    assert_eq!(app.post(&uri, &[]).await.status(), StatusCode::NOT_FOUND);
    app.logout().await;

    app.sign_in("dev@example.com", "dev").await;
    assert_eq!(app.post(&uri, &[]).await.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.post(&uri, &[]).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.scalar("SELECT COUNT(*) FROM applicants").await, 1);
}

#[tokio::test]
async fn test_accept_fills_position_and_notifies() {
    let mut app = TestApp::new().await;
    let (_, position_pk) = project_with_position(&mut app).await;
    let dev = app.sign_in("dev@example.com", "dev").await;
    app.post(&format!("/applications/request/{}", position_pk), &[])
        .await;
    app.logout().await;

    app.login("owner@example.com").await;
    let body = text(app.get("/applications").await).await;
    assert!(body.contains("dev"));
    assert!(body.contains(&format!("/applications/accept/{}/{}", position_pk, dev.pk)));

    let response = app
        .post(
            &format!("/applications/accept/{}/{}", position_pk, dev.pk),
            &[],
        )
        .await;

    assert_eq!(location(&response), "/applications");
    assert_eq!(app.scalar("SELECT filled_by_pk FROM positions").await, dev.pk);
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM notifications WHERE verb = 'You have been accepted as a Python Developer for the project: Rocket'")
            .await,
        1
    );
    assert!(text(app.get("/applications/view/accepted").await)
        .await
        .contains("Rocket"));

    // A filled position no longer takes applications.
    app.logout().await;
    app.sign_in("late@example.com", "late").await;
    let response = app
        .post(&format!("/applications/request/{}", position_pk), &[])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reject_accepted_applicant_reopens_position() {
    let mut app = TestApp::new().await;
    let (_, position_pk) = project_with_position(&mut app).await;
    let dev = app.sign_in("dev@example.com", "dev").await;
    app.post(&format!("/applications/request/{}", position_pk), &[])
        .await;
    app.logout().await;

    app.login("owner@example.com").await;
    app.post(
        &format!("/applications/accept/{}/{}", position_pk, dev.pk),
        &[],
    )
    .await;
    let response = app
        .post(
            &format!("/applications/reject/{}/{}", position_pk, dev.pk),
            &[],
        )
        .await;

    assert_eq!(location(&response), "/applications");
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM positions WHERE filled_by_pk IS NULL")
            .await,
        1
    );
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM notifications WHERE verb = 'You have been rejected as a Python Developer for the project: Rocket'")
            .await,
        1
    );
    assert!(text(app.get("/applications/view/rejected").await)
        .await
        .contains("dev"));
}

#[tokio::test]
async fn test_only_the_owner_can_accept() {
    let mut app = TestApp::new().await;
    let (_, position_pk) = project_with_position(&mut app).await;
    let dev = app.sign_in("dev@example.com", "dev").await;
    app.post(&format!("/applications/request/{}", position_pk), &[])
        .await;

    let response = app
        .post(
            &format!("/applications/accept/{}/{}", position_pk, dev.pk),
            &[],
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.scalar("SELECT COUNT(*) FROM positions WHERE filled_by_pk IS NULL")
            .await,
        1
    );
}

#[tokio::test]
async fn test_accepting_without_application_is_not_found() {
    let mut app = TestApp::new().await;
    let (_, position_pk) = project_with_position(&mut app).await;
    let stranger = app.create_user("stranger@example.com", "stranger", false).await;

    app.login("owner@example.com").await;
    let response = app
        .post(
            &format!("/applications/accept/{}/{}", position_pk, stranger.pk),
            &[],
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cannot_accept_on_a_position_filled_by_someone_else() {
    let mut app = TestApp::new().await;
    let (_, position_pk) = project_with_position(&mut app).await;
    let first = app.sign_in("first@example.com", "first").await;
    app.post(&format!("/applications/request/{}", position_pk), &[])
        .await;
    app.logout().await;
    let second = app.sign_in("second@example.com", "second").await;
    app.post(&format!("/applications/request/{}", position_pk), &[])
        .await;
    app.logout().await;

    app.login("owner@example.com").await;
    app.post(
        &format!("/applications/accept/{}/{}", position_pk, first.pk),
        &[],
    )
    .await;
    let response = app
        .post(
            &format!("/applications/accept/{}/{}", position_pk, second.pk),
            &[],
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.scalar("SELECT filled_by_pk FROM positions").await, first.pk);
    assert_eq!(
        app.scalar(&format!(
            "SELECT COUNT(*) FROM applicants WHERE applicant_pk = {} AND accepted = 1",
            second.pk
        ))
        .await,
        0
    );
}
