use axum::Router;
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};

use crate::{config::Config, state::WebsiteState, views};

use super::get_router;

pub const ENV_PREFIX: &str = "TEAM_BUILDER_";

pub struct WebsiteService {
    config: Config,
    router: Option<Router>,
}

impl WebsiteService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            router: None,
        }
    }

    pub fn router(&self) -> Option<&Router> {
        self.router.as_ref()
    }

    /// Builds the state and the full router. Must run inside a tokio runtime.
    pub fn set_up(&mut self) -> WebsiteState {
        let state = WebsiteState::new(self.config.clone());
        let routes = views::routes(state.clone());
        let router = get_router(
            state.clone(),
            routes,
            self.config.media_root(),
            self.config.max_upload_size as usize,
        );
        self.router = Some(router);
        state
    }

    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self
            .router
            .ok_or_else(|| std::io::Error::other("the service was not set up"))?;
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.config.print();
        tracing::info!(addr = ?self.config.socket_addr(), "website listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
