use menva::FromEnv;
use std::{fmt, net::Ipv4Addr, path::PathBuf, str::FromStr};

#[derive(Debug, Clone, PartialEq)]
pub enum Env {
    Development,
    Production,
    Test,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Env::Development),
            "production" => Ok(Env::Production),
            "test" => Ok(Env::Test),
            _ => Err(format!("Invalid value for enum Env: {}", s)),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Test => write!(f, "test"),
        }
    }
}

#[derive(Debug, Clone, FromEnv)]
pub struct Config {
    pub env: Env,
    ip: Ipv4Addr,
    port: u16,
    domain: String,
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    pub max_upload_size: u64,
    pub database_url: String,
    media_root: String,
    sentry_token: String,
    pub session_key: String,
    pub session_cookie_name: String,
    pub session_expiration: i64,
    pub csrf_cookie_name: String,
    pub login_redirect_to: String,
    pub email_validation: bool,
    pub email_validation_redirect: String,
    pub email_default_sender: String,
    pub token_expiration_hours: i64,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_relay: String,
}

impl Config {
    pub fn stub() -> Self {
        Self {
            env: Env::Test,
            ip: Ipv4Addr::new(127, 0, 0, 1),
            port: 8000,
            domain: "localhost".into(),
            worker_threads: 1,
            max_blocking_threads: 1,
            max_upload_size: 10485760,
            database_url: "sqlite://./test.sqlite".into(),
            media_root: "./test-media".into(),
            sentry_token: String::new(),
            session_key: "session_key".into(),
            session_cookie_name: "session_id".into(),
            session_expiration: 30,
            csrf_cookie_name: "csrf_token".into(),
            login_redirect_to: "/login_router".into(),
            email_validation: true,
            email_validation_redirect: "/accounts/email_confirmation".into(),
            email_default_sender: "team-builder@example.com".into(),
            token_expiration_hours: 24,
            smtp_username: "smtp_username".into(),
            smtp_password: "smtp_password".into(),
            smtp_relay: "smtp_relay".into(),
        }
    }

    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }

    pub fn with_media_root(mut self, media_root: impl Into<String>) -> Self {
        self.media_root = media_root.into();
        self
    }

    pub fn with_email_validation(mut self, email_validation: bool) -> Self {
        self.email_validation = email_validation;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn socket_addr(&self) -> (Ipv4Addr, u16) {
        (self.ip, self.port)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn media_root(&self) -> PathBuf {
        PathBuf::from(&self.media_root)
    }

    pub fn sentry_token(&self) -> Option<&str> {
        if self.sentry_token.is_empty() {
            None
        } else {
            Some(&self.sentry_token)
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }

    pub fn build_url(&self, path: &str) -> String {
        let (protocol, domain) = if self.domain.starts_with("localhost")
            || self.domain.starts_with("127.0.0.1")
            || self.domain.starts_with("0.0.0.0")
        {
            ("http", &format!("{}:{}", self.domain, self.port))
        } else {
            ("https", &self.domain)
        };

        format!("{}://{}{}", protocol, domain, path)
    }

    pub fn print(&self) {
        println!("http://{:?}:{:?}", &self.ip, &self.port)
    }
}
