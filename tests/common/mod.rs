#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use tempfile::TempDir;
use team_builder::{
    auth::hash_password,
    config::Config,
    models::User,
    service::StubService,
};

pub const PASSWORD: &str = "a-long-enough-password";

/// Browser-like client: keeps the session and csrf cookies between requests.
pub struct TestApp {
    pub service: StubService,
    cookies: HashMap<String, String>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|config| config).await
    }

    pub async fn with_config(configure: impl FnOnce(Config) -> Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let database_url = format!("sqlite://{}", dir.path().join("test.sqlite").display());
        let config = Config::stub()
            .with_database_url(database_url)
            .with_media_root(dir.path().join("media").display().to_string());

        Self {
            service: StubService::new(configure(config)).await,
            cookies: HashMap::new(),
            _dir: dir,
        }
    }

    pub fn csrf_token(&self) -> String {
        self.cookies.get("csrf_token").cloned().unwrap_or_default()
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn store_cookies(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap();
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.insert(name.trim().into(), value.trim().into());
            }
        }
    }

    pub async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let response = self.service.request(request).await;
        self.store_cookies(&response);
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, self.cookie_header())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Posts an urlencoded form, adding the csrf token of the current session.
    pub async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        if self.csrf_token().is_empty() {
            self.get("/").await;
        }
        let token = self.csrf_token();
        let mut pairs: Vec<(&str, &str)> = vec![("csrf_token", token.as_str())];
        pairs.extend_from_slice(fields);
        self.post_raw(uri, serde_urlencoded::to_string(&pairs).unwrap())
            .await
    }

    pub async fn post_raw(&mut self, uri: &str, body: String) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, self.cookie_header())
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Posts a multipart form with the csrf token and an optional file field.
    pub async fn post_multipart(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response<Body> {
        if self.csrf_token().is_empty() {
            self.get("/").await;
        }
        let boundary = "team-builder-test-boundary";
        let token = self.csrf_token();
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in std::iter::once(("csrf_token", token.as_str())).chain(fields.iter().copied()) {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    boundary, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, content)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    boundary, name, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .header(header::COOKIE, self.cookie_header())
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn create_user(&self, email: &str, username: &str, is_staff: bool) -> User {
        let password = hash_password(PASSWORD).unwrap();
        let mut conn = self.service.database().acquire().await.unwrap();
        User::create(email, username, &password, true, is_staff, &mut conn)
            .await
            .unwrap()
    }

    pub async fn login(&mut self, email: &str) {
        let response = self
            .post("/accounts/login", &[("email", email), ("password", PASSWORD)])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    pub async fn logout(&mut self) {
        self.get("/accounts/logout").await;
    }

    /// Creates an active user and logs the client in as that user.
    pub async fn sign_in(&mut self, email: &str, username: &str) -> User {
        let user = self.create_user(email, username, false).await;
        self.login(email).await;
        user
    }

    pub async fn scalar(&self, query: &str) -> i64 {
        let mut conn = self.service.database().acquire().await.unwrap();
        sqlx::query_scalar(query).fetch_one(&mut *conn).await.unwrap()
    }
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned()
}

pub async fn text(response: Response<Body>) -> String {
    StubService::body_text(response).await
}
