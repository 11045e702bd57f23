use chrono::{Duration, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{database::Database, errors::AppError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Session(Arc<RwLock<UserSession>>);

impl Session {
    pub async fn user_pk(&self) -> Option<i64> {
        self.0.read().await.user_pk
    }

    pub async fn id(&self) -> String {
        self.0.read().await.session_id.to_owned()
    }

    pub async fn csrf_token(&self, secret: &str) -> String {
        generate_token(secret, &self.0.read().await.session_id)
    }

    pub async fn token_is_valid(&self, secret: &str, token: &str) -> bool {
        !token.is_empty() && self.csrf_token(secret).await.eq(token)
    }
}

#[derive(Clone, Debug)]
pub struct Sessions(Database);

impl Sessions {
    pub fn new(database: Database) -> Self {
        Self(database)
    }

    pub async fn find_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        let mut conn = self.0.acquire().await?;
        let session = UserSession::from_session_id(session_id, &mut conn).await?;
        match session {
            Some(mut session) => {
                session.update_last_accessed().update(&mut conn).await?;
                Ok(Some(Session(Arc::new(RwLock::new(session)))))
            }
            None => Ok(None),
        }
    }

    /// Expired rows are purged every time a new session is created.
    pub async fn create_session(&self, session_expiration: i64) -> Result<Session, AppError> {
        let mut conn = self.0.acquire().await?;
        UserSession::delete_expired(&mut conn).await?;
        let session = UserSession::new(None, session_expiration);
        session.save(&mut conn).await?;
        Ok(Session(Arc::new(RwLock::new(session))))
    }

    /// Rotates the session id and binds the session to `user_pk`.
    pub async fn login(&self, session: &Session, user_pk: i64) -> Result<(), AppError> {
        self.rotate(session, Some(user_pk)).await
    }

    pub async fn logout(&self, session: &Session) -> Result<(), AppError> {
        self.rotate(session, None).await
    }

    async fn rotate(&self, session: &Session, user_pk: Option<i64>) -> Result<(), AppError> {
        let mut tx = self.0.start_transaction().await?;
        let mut storage = session.0.write().await;
        storage.delete(&mut tx).await?;
        storage.new_session_id().update_user(user_pk).save(&mut tx).await?;
        tx.commit().await?;
        tracing::debug!(user_pk = ?user_pk, "session rotated");
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct UserSession {
    session_id: String,
    user_pk: Option<i64>,
    last_accessed: NaiveDateTime,
    expiration: NaiveDateTime,
}

impl UserSession {
    fn new(user_pk: Option<i64>, session_expiration: i64) -> Self {
        let today = Utc::now().naive_utc();
        Self {
            session_id: Uuid::now_v7().to_string(),
            user_pk,
            last_accessed: today,
            expiration: today + Duration::days(session_expiration),
        }
    }

    fn new_session_id(&mut self) -> &mut Self {
        self.session_id = Uuid::now_v7().to_string();
        self
    }

    fn update_user(&mut self, user_pk: Option<i64>) -> &mut Self {
        self.user_pk = user_pk;
        self
    }

    fn update_last_accessed(&mut self) -> &mut Self {
        self.last_accessed = Utc::now().naive_utc();
        self
    }

    async fn from_session_id(
        session_id: &str,
        conn: &mut SqliteConnection,
    ) -> Result<Option<Self>, AppError> {
        sqlx::query_as(
            "SELECT session_id, user_pk, last_accessed, expiration FROM web_sessions WHERE session_id = $1 AND expiration > $2;",
        )
        .bind(session_id)
        .bind(Utc::now().naive_utc())
        .fetch_optional(conn)
        .await
        .map_err(AppError::from)
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("INSERT INTO web_sessions(session_id, user_pk, last_accessed, expiration) VALUES ($1, $2, $3, $4);")
            .bind(&self.session_id)
            .bind(self.user_pk)
            .bind(self.last_accessed)
            .bind(self.expiration)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("UPDATE web_sessions SET last_accessed = $1 WHERE session_id = $2;")
            .bind(self.last_accessed)
            .bind(&self.session_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("DELETE FROM web_sessions WHERE session_id = $1;")
            .bind(&self.session_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn delete_expired(conn: &mut SqliteConnection) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM web_sessions WHERE expiration <= $1;")
            .bind(Utc::now().naive_utc())
            .execute(conn)
            .await?
            .rows_affected();
        if deleted > 0 {
            tracing::debug!(deleted, "expired sessions removed");
        }
        Ok(())
    }
}

fn generate_token(secret: &str, data: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_deterministic_per_session() {
        let first = generate_token("secret", "session-a");
        assert_eq!(first, generate_token("secret", "session-a"));
        assert_ne!(first, generate_token("secret", "session-b"));
        assert_ne!(first, generate_token("other", "session-a"));
        assert_eq!(first.len(), 64);
    }

    #[tokio::test]
    async fn test_token_is_valid_rejects_empty_and_foreign_tokens() {
        let session = Session(Arc::new(RwLock::new(UserSession::new(None, 1))));
        let token = session.csrf_token("secret").await;

        assert!(session.token_is_valid("secret", &token).await);
        assert!(!session.token_is_valid("secret", "").await);
        assert!(!session.token_is_valid("another-secret", &token).await);
    }

    #[test]
    fn test_new_session_id_changes_the_id_only() {
        let mut session = UserSession::new(Some(3), 1);
        let previous = session.session_id.clone();
        session.new_session_id();
        assert_ne!(previous, session.session_id);
        assert_eq!(session.user_pk, Some(3));
    }
}
