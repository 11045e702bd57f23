use std::{fmt, sync::Arc};

use lettre::{
    transport::{
        smtp::{authentication::Credentials, client::Tls},
        stub::AsyncStubTransport,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::{Config, Env},
    errors::AppError,
};

#[derive(Clone)]
pub enum Mailer {
    Smtp(Arc<AsyncSmtpTransport<Tokio1Executor>>),
    Stub(AsyncStubTransport),
}

impl fmt::Debug for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smtp(_) => write!(f, "Mailer::Smtp"),
            Self::Stub(_) => write!(f, "Mailer::Stub"),
        }
    }
}

impl Default for Mailer {
    fn default() -> Self {
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("0.0.0.0")
                .port(1025)
                .tls(Tls::None)
                .build();
        Self::Smtp(Arc::new(mailer))
    }
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        match config.env {
            Env::Test => Self::stub(),
            Env::Development => Self::default(),
            Env::Production => {
                let creds =
                    Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

                let mailer: AsyncSmtpTransport<Tokio1Executor> =
                    AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_relay)
                        .expect("Something went wrong with the smtp transport for the Mailer")
                        .credentials(creds)
                        .build();
                Self::Smtp(Arc::new(mailer))
            }
        }
    }

    pub fn stub() -> Self {
        Self::Stub(AsyncStubTransport::new_ok())
    }

    pub async fn send(&self, message: &Message) -> Result<(), AppError> {
        let raw = message.formatted();
        let envelope = message.envelope();
        match self {
            Self::Smtp(transport) => transport
                .send_raw(envelope, &raw)
                .await
                .map(|_| ())
                .map_err(|e| AppError::Mail(e.to_string())),
            Self::Stub(transport) => transport
                .send_raw(envelope, &raw)
                .await
                .map_err(|e| AppError::Mail(e.to_string())),
        }?;
        tracing::info!(to = ?envelope.to(), "email sent");
        Ok(())
    }
}
