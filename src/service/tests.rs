use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
};
use http_body_util::BodyExt;

use crate::{config::Config, database::Database, state::WebsiteState};

use tower::{Service, ServiceExt}; // for `call` and `ready`

use super::WebsiteService;

/// A fully wired website with migrations applied, driven in-process.
pub struct StubService {
    service: WebsiteService,
    state: WebsiteState,
}

impl StubService {
    pub async fn new(config: Config) -> Self {
        let mut service = WebsiteService::new(config);
        let state = service.set_up();
        state.database().run_migrations().await;
        Self { service, state }
    }

    pub fn database(&self) -> &Database {
        self.state.database()
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.service
            .router()
            .expect("set up in new")
            .clone()
            .layer(MockConnectInfo(SocketAddr::from(([0, 0, 0, 0], 8000))))
            .into_service()
            .ready()
            .await
            .unwrap()
            .call(req)
            .await
            .unwrap()
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&body).into_owned()
    }
}
