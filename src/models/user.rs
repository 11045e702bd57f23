use chrono::{NaiveDateTime, Utc};
use sqlx::{prelude::FromRow, SqliteConnection};

use crate::errors::AppError;

const USER_COLUMNS: &str =
    "users.pk, users.email, users.username, users.avatar, users.bio, users.color, users.is_active, users.is_staff, users.date_joined";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub pk: i64,
    pub email: String,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub color: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: NaiveDateTime,
}

#[derive(FromRow)]
pub struct UserWithPassword {
    #[sqlx(flatten)]
    pub user: User,
    pub password: String,
}

pub struct ProfileChanges<'a> {
    pub username: &'a str,
    pub bio: &'a str,
    pub color: &'a str,
}

impl User {
    /// First letter of the username, shown when there is no avatar.
    pub fn initial(&self) -> String {
        self.username
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "?".into())
    }

    pub async fn create(
        email: &str,
        username: &str,
        password: &str,
        is_active: bool,
        is_staff: bool,
        conn: &mut SqliteConnection,
    ) -> Result<Self, AppError> {
        sqlx::query_as(&format!(
            "INSERT INTO users (email, username, password, is_active, is_staff, date_joined) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {};",
            USER_COLUMNS.replace("users.", "")
        ))
        .bind(normalize_email(email))
        .bind(username)
        .bind(password)
        .bind(is_active)
        .bind(is_staff)
        .bind(Utc::now().naive_utc())
        .fetch_one(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn find_by_pk(pk: i64, conn: &mut SqliteConnection) -> Result<Option<Self>, AppError> {
        sqlx::query_as(&format!("SELECT {} FROM users WHERE pk = $1;", USER_COLUMNS))
            .bind(pk)
            .fetch_optional(conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn get_by_pk(pk: i64, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        Self::find_by_pk(pk, conn)
            .await?
            .ok_or(AppError::DoesNotExist)
    }

    pub async fn find_by_email_with_password(
        email: &str,
        conn: &mut SqliteConnection,
    ) -> Result<Option<UserWithPassword>, AppError> {
        sqlx::query_as(&format!(
            "SELECT {}, users.password FROM users WHERE email = $1;",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn email_exists(email: &str, conn: &mut SqliteConnection) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1;")
            .bind(normalize_email(email))
            .fetch_one(conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn set_to_active(mut self, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query("UPDATE users SET is_active = 1 WHERE pk = $1;")
            .bind(self.pk)
            .execute(conn)
            .await?;
        self.is_active = true;
        Ok(self)
    }

    pub async fn update_profile(
        &self,
        changes: ProfileChanges<'_>,
        conn: &mut SqliteConnection,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET username = $1, bio = $2, color = $3 WHERE pk = $4;")
            .bind(changes.username)
            .bind(changes.bio)
            .bind(changes.color)
            .bind(self.pk)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn set_avatar(&self, avatar: &str, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar = $1 WHERE pk = $2;")
            .bind(avatar)
            .bind(self.pk)
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Lowercases the domain part of an address, the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_owned(),
    }
}
