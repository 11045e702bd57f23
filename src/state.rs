use axum::extract::FromRef;

use crate::{config::Config, database::Database, mailing::Mailer, sessions::Sessions};

#[derive(Clone, FromRef)]
pub struct WebsiteState {
    config: Config,
    database: Database,
    sessions: Sessions,
    mailer: Mailer,
}

impl WebsiteState {
    pub fn new(config: Config) -> Self {
        let database = Database::new(&config.database_url);
        Self {
            sessions: Sessions::new(database.clone()),
            mailer: Mailer::new(&config),
            database,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }
}
