mod common;

use std::io::Cursor;

use axum::http::StatusCode;
use common::{location, text, TestApp};
use image::{ImageFormat, RgbImage};

fn png() -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    RgbImage::new(400, 300)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

#[tokio::test]
async fn test_edit_profile_and_skills() {
    let mut app = TestApp::new().await;
    let me = app.sign_in("me@example.com", "me").await;

    let response = app
        .post_multipart(
            "/profile/edit",
            &[
                ("username", "Ada Lovelace"),
                ("bio", "Poetical science"),
                ("color", "#112233"),
                ("skills", "6"),
                ("skills", "2"),
                ("new_skill", ""),
            ],
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/profile/view/{}", me.pk));
    assert_eq!(
        app.scalar(&format!("SELECT COUNT(*) FROM all_skills WHERE user_pk = {}", me.pk))
            .await,
        2
    );

    let body = text(app.get(&format!("/profile/view/{}", me.pk)).await).await;
    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("Poetical science"));
    assert!(body.contains("Python Developer"));

    // With a bio the login router goes to the profile page.
    let response = app.get("/login_router").await;
    assert_eq!(location(&response), format!("/profile/view/{}", me.pk));
}

#[tokio::test]
async fn test_unchecked_skills_are_removed() {
    let mut app = TestApp::new().await;
    let me = app.sign_in("me@example.com", "me").await;
    let fields = [("username", "me"), ("bio", ""), ("color", "#112233")];

    let mut with_skill = fields.to_vec();
    with_skill.push(("skills", "3"));
    app.post_multipart("/profile/edit", &with_skill, None).await;
    app.post_multipart("/profile/edit", &fields, None).await;

    assert_eq!(
        app.scalar(&format!("SELECT COUNT(*) FROM all_skills WHERE user_pk = {}", me.pk))
            .await,
        0
    );
}

#[tokio::test]
async fn test_invalid_color_is_a_form_error() {
    let mut app = TestApp::new().await;
    app.sign_in("me@example.com", "me").await;

    let response = app
        .post_multipart(
            "/profile/edit",
            &[("username", "me"), ("bio", ""), ("color", "red")],
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Enter a color like #4A90E2."));
}

#[tokio::test]
async fn test_avatar_upload_is_resized_and_served() {
    let mut app = TestApp::new().await;
    let me = app.sign_in("me@example.com", "me").await;

    let image = png();
    let response = app
        .post_multipart(
            "/profile/edit",
            &[("username", "me"), ("bio", ""), ("color", "#112233")],
            Some(("avatar", "me.png", image.as_slice())),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let avatar: String = {
        let mut conn = app.service.database().acquire().await.unwrap();
        sqlx::query_scalar("SELECT avatar FROM users WHERE pk = $1")
            .bind(me.pk)
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    };
    assert!(avatar.starts_with("/media/avatars/"));

    let response = app.get(&avatar).await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn avatar_of(app: &TestApp, user_pk: i64) -> String {
    let mut conn = app.service.database().acquire().await.unwrap();
    sqlx::query_scalar("SELECT avatar FROM users WHERE pk = $1")
        .bind(user_pk)
        .fetch_one(&mut *conn)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_replacing_the_avatar_removes_the_previous_file() {
    let mut app = TestApp::new().await;
    let me = app.sign_in("me@example.com", "me").await;
    let fields = [("username", "me"), ("bio", ""), ("color", "#112233")];
    let image = png();

    app.post_multipart("/profile/edit", &fields, Some(("avatar", "me.png", image.as_slice())))
        .await;
    let first = avatar_of(&app, me.pk).await;
    app.post_multipart("/profile/edit", &fields, Some(("avatar", "me.png", image.as_slice())))
        .await;
    let second = avatar_of(&app, me.pk).await;

    assert_ne!(first, second);
    assert_eq!(app.get(&first).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&second).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_garbage_avatar_is_a_form_error() {
    let mut app = TestApp::new().await;
    app.sign_in("me@example.com", "me").await;

    let response = app
        .post_multipart(
            "/profile/edit",
            &[("username", "me"), ("bio", ""), ("color", "#112233")],
            Some(("avatar", "me.png", &b"definitely not an image"[..])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Upload a valid image."));
}

#[tokio::test]
async fn test_staff_new_skill_is_added_directly() {
    let mut app = TestApp::new().await;
    let staff = app.create_user("staff@example.com", "staff", true).await;
    app.login("staff@example.com").await;

    app.post_multipart(
        "/profile/edit",
        &[
            ("username", "staff"),
            ("bio", ""),
            ("color", "#112233"),
            ("new_skill", "Rust Developer"),
        ],
        None,
    )
    .await;

    assert_eq!(app.scalar("SELECT COUNT(*) FROM skill_confirmations").await, 0);
    assert_eq!(
        app.scalar(&format!(
            "SELECT COUNT(*) FROM all_skills INNER JOIN skills ON skills.pk = all_skills.skill_pk
                WHERE user_pk = {} AND skills.name = 'Rust Developer'",
            staff.pk
        ))
        .await,
        1
    );
}

#[tokio::test]
async fn test_profile_page_is_public() {
    let mut app = TestApp::new().await;
    let other = app.create_user("other@example.com", "someone", false).await;

    let response = app.get(&format!("/profile/view/{}", other.pk)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = text(response).await;
    assert!(body.contains("someone"));
    assert!(!body.contains("Edit profile"));
}
