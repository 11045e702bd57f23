use chrono::{Duration, NaiveDateTime, Utc};
use lettre::{message::header::ContentType, Message};
use sqlx::{prelude::FromRow, SqliteConnection};
use uuid::Uuid;

use crate::{config::Config, errors::AppError, log_and_wrap_custom_internal, mailing::Mailer};

/// Single use token sent by email to confirm a new account.
#[derive(Debug, Clone, FromRow)]
pub struct AuthenticationToken {
    pub user_pk: i64,
    pub token: String,
    pub expires_at: NaiveDateTime,
}

impl AuthenticationToken {
    pub fn new(user_pk: i64, expiration_hours: i64) -> Self {
        Self {
            user_pk,
            token: Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now().naive_utc() + Duration::hours(expiration_hours),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().naive_utc()
    }

    /// Issuing a token again for the same user replaces the previous one.
    pub async fn save(self, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query(
            "INSERT INTO authentication_tokens (user_pk, token, expires_at) VALUES ($1, $2, $3)
                ON CONFLICT (user_pk) DO UPDATE SET token = excluded.token, expires_at = excluded.expires_at;",
        )
        .bind(self.user_pk)
        .bind(&self.token)
        .bind(self.expires_at)
        .execute(conn)
        .await?;
        Ok(self)
    }

    pub async fn find(token: &str, conn: &mut SqliteConnection) -> Result<Option<Self>, AppError> {
        sqlx::query_as(
            "SELECT user_pk, token, expires_at FROM authentication_tokens WHERE token = $1;",
        )
        .bind(token)
        .fetch_optional(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn delete(self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("DELETE FROM authentication_tokens WHERE token = $1;")
            .bind(&self.token)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub fn confirmation_path(&self) -> String {
        format!("/accounts/token_confirmation/{}", self.token)
    }

    pub async fn send(&self, config: &Config, mailer: &Mailer, to: &str) -> Result<(), AppError> {
        let body = format!(
            "Welcome to Team Builder!\n\nPlease click the following link to confirm your email: {}\n\nThe link expires in {} hours.",
            config.build_url(&self.confirmation_path()),
            config.token_expiration_hours
        );
        let message = Message::builder()
            .from(
                config
                    .email_default_sender
                    .parse::<lettre::message::Mailbox>()
                    .map_err(|e| log_and_wrap_custom_internal!(e))?,
            )
            .to(to.parse::<lettre::message::Mailbox>().map_err(|e| log_and_wrap_custom_internal!(e))?)
            .subject("Confirm your Team Builder account")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| log_and_wrap_custom_internal!(e))?;
        mailer.send(&message).await
    }
}
