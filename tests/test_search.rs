mod common;

use axum::http::StatusCode;
use common::{location, text, TestApp};

async fn create_project(app: &mut TestApp, title: &str, skill: &str, information: &str) {
    app.post(
        "/project/new",
        &[
            ("title", title),
            ("description", "Something worth doing"),
            ("time_line", "Summer"),
            ("requirements", "Curiosity"),
            ("form-TOTAL_FORMS", "1"),
            ("form-0-skill", skill),
            ("form-0-information", information),
            ("form-0-time_commitment", ""),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_empty_search_goes_home() {
    let mut app = TestApp::new().await;

    let response = app.get("/search?search_term=++").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_search_matches_titles_and_position_information() {
    let mut app = TestApp::new().await;
    app.sign_in("owner@example.com", "owner").await;
    create_project(&mut app, "Rocket", "6", "Build the telemetry pipeline").await;
    create_project(&mut app, "Garden", "2", "Draw the flowers").await;

    let body = text(app.get("/search?search_term=rocket").await).await;
    assert!(body.contains("1 results were found with: rocket"));
    assert!(body.contains("Rocket"));
    assert!(!body.contains("Garden"));

    let body = text(app.get("/search?search_term=telemetry").await).await;
    assert!(body.contains("1 results were found with: telemetry"));

    let body = text(app.get("/search?search_term=submarine").await).await;
    assert!(body.contains("No results were found with: submarine"));
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let mut app = TestApp::new().await;
    app.sign_in("owner@example.com", "owner").await;
    create_project(&mut app, "Rocket", "6", "Backend").await;

    let body = text(app.get("/search?search_term=%25").await).await;

    assert!(body.contains("No results were found with: %"));
}

#[tokio::test]
async fn test_search_by_skill_uses_url_names() {
    let mut app = TestApp::new().await;
    app.sign_in("owner@example.com", "owner").await;
    create_project(&mut app, "Rocket", "6", "Backend").await;
    create_project(&mut app, "Garden", "2", "Flowers").await;

    let body = text(app.get("/search/skill/Python_Developer").await).await;
    assert!(body.contains("1 results were found with: Python Developer"));
    assert!(body.contains("Rocket"));
    assert!(!body.contains("Garden"));

    let body = text(app.get("/search/skill/Unknown_Skill").await).await;
    assert!(body.contains("No results were found with: Unknown Skill"));
}

#[tokio::test]
async fn test_search_your_skills() {
    let mut app = TestApp::new().await;
    app.sign_in("owner@example.com", "owner").await;
    create_project(&mut app, "Rocket", "6", "Backend").await;
    create_project(&mut app, "Garden", "2", "Flowers").await;
    app.logout().await;

    let dev = app.sign_in("dev@example.com", "dev").await;
    {
        let mut conn = app.service.database().acquire().await.unwrap();
        sqlx::query("INSERT INTO all_skills (user_pk, skill_pk) VALUES ($1, 2)")
            .bind(dev.pk)
            .execute(&mut *conn)
            .await
            .unwrap();
    }

    let body = text(app.get("/search/your_skills").await).await;

    assert!(body.contains("1 results were found with: your skills"));
    assert!(body.contains("Garden"));
    assert!(!body.contains("Rocket"));
}

#[tokio::test]
async fn test_search_your_skills_requires_login() {
    let mut app = TestApp::new().await;

    let response = app.get("/search/your_skills").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
