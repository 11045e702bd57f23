use menva::read_default_file;
use sentry::ClientInitGuard;

use crate::{
    auth::hash_password,
    config::Config,
    errors::AppError,
    models::User,
    service::{WebsiteService, ENV_PREFIX},
    state::WebsiteState,
};

use super::tracing::init_tracing;

/// Boots the website: environment, tracing, migrations and the tokio runtime.
pub struct ServicesOrquestrator {
    config: Config,
    run_migrations: bool,
    _sentry: Option<ClientInitGuard>,
}

impl Default for ServicesOrquestrator {
    fn default() -> Self {
        Self {
            config: Config::stub(),
            run_migrations: false,
            _sentry: None,
        }
    }
}

impl ServicesOrquestrator {
    pub fn load_environment_variables(self) -> Self {
        read_default_file();
        self
    }

    pub fn set_config_from_env(mut self) -> Self {
        self.config = Config::from_env_with_prefix(ENV_PREFIX);
        self
    }

    pub fn override_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.config = self.config.with_port(port);
        }
        self
    }

    pub fn enable_migrations(mut self) -> Self {
        self.run_migrations = true;
        self
    }

    pub fn init_tracing(mut self) -> Self {
        self._sentry = init_tracing(&self.config.env, self.config.sentry_token());
        self
    }

    fn runtime(&self) -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(self.config.worker_threads.max(1))
            .max_blocking_threads(self.config.max_blocking_threads.max(1))
            .build()
    }

    pub fn run(self) -> std::io::Result<()> {
        self.runtime()?.block_on(async {
            let mut service = WebsiteService::new(self.config.clone());
            let state = service.set_up();
            if self.run_migrations {
                state.database().run_migrations().await;
            }
            service.run().await
        })
    }

    /// Creates an active staff account, the only way to get one.
    pub fn create_staff(self, email: &str, username: &str, password: &str) -> Result<User, AppError> {
        let runtime = self
            .runtime()
            .map_err(|e| AppError::custom_internal(&e.to_string()))?;

        runtime.block_on(async {
            let state = WebsiteState::new(self.config.clone());
            if self.run_migrations {
                state.database().run_migrations().await;
            }
            let password = hash_password(password)?;
            let mut conn = state.database().acquire().await?;
            let user = User::create(email, username, &password, true, true, &mut conn).await?;
            tracing::info!(user_pk = user.pk, "staff user created");
            Ok::<User, AppError>(user)
        })
    }
}
