use chrono::{NaiveDateTime, Utc};
use sqlx::{prelude::FromRow, SqliteConnection};

use crate::errors::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub pk: i64,
    pub recipient_pk: i64,
    pub actor_pk: i64,
    pub actor_username: String,
    pub verb: String,
    pub unread: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationFilter {
    All,
    Unread,
    Read,
}

impl NotificationFilter {
    fn condition(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::Unread => " AND notifications.unread = 1",
            Self::Read => " AND notifications.unread = 0",
        }
    }
}

impl Notification {
    pub async fn send(
        recipient_pk: i64,
        actor_pk: i64,
        verb: &str,
        conn: &mut SqliteConnection,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (recipient_pk, actor_pk, verb, unread, created_at) VALUES ($1, $2, $3, 1, $4);",
        )
        .bind(recipient_pk)
        .bind(actor_pk)
        .bind(verb)
        .bind(Utc::now().naive_utc())
        .execute(conn)
        .await?;
        tracing::debug!(recipient_pk, actor_pk, "notification sent");
        Ok(())
    }

    pub async fn list(
        recipient_pk: i64,
        filter: NotificationFilter,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "SELECT notifications.pk, notifications.recipient_pk, notifications.actor_pk,
                    users.username AS actor_username, notifications.verb, notifications.unread,
                    notifications.created_at
                FROM notifications
                INNER JOIN users ON users.pk = notifications.actor_pk
                WHERE notifications.recipient_pk = $1{}
                ORDER BY notifications.pk DESC;",
            filter.condition()
        ))
        .bind(recipient_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn count_unread(recipient_pk: i64, conn: &mut SqliteConnection) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_pk = $1 AND unread = 1;",
        )
        .bind(recipient_pk)
        .fetch_one(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn mark_read(pk: i64, recipient_pk: i64, conn: &mut SqliteConnection) -> Result<(), AppError> {
        Self::set_unread(pk, recipient_pk, false, conn).await
    }

    pub async fn mark_unread(
        pk: i64,
        recipient_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<(), AppError> {
        Self::set_unread(pk, recipient_pk, true, conn).await
    }

    async fn set_unread(
        pk: i64,
        recipient_pk: i64,
        unread: bool,
        conn: &mut SqliteConnection,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE notifications SET unread = $1 WHERE pk = $2 AND recipient_pk = $3;")
                .bind(unread)
                .bind(pk)
                .bind(recipient_pk)
                .execute(conn)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::DoesNotExist);
        }
        Ok(())
    }

    pub async fn delete(pk: i64, recipient_pk: i64, conn: &mut SqliteConnection) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE pk = $1 AND recipient_pk = $2;")
            .bind(pk)
            .bind(recipient_pk)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::DoesNotExist);
        }
        Ok(())
    }
}

pub fn pending_application_message(project_title: &str) -> String {
    format!("There is a pending application for the project: {}", project_title)
}

pub fn accepted_message(skill: &str, project_title: &str) -> String {
    format!("You have been accepted as a {} for the project: {}", skill, project_title)
}

pub fn rejected_message(skill: &str, project_title: &str) -> String {
    format!("You have been rejected as a {} for the project: {}", skill, project_title)
}

pub fn skill_accepted_message(skill: &str) -> String {
    format!("Your skill request has been accepted: {}", skill)
}

pub fn skill_denied_message(skill: &str) -> String {
    format!("Your skill request has been denied: {}", skill)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_messages() {
        assert_eq!(
            pending_application_message("Rocket"),
            "There is a pending application for the project: Rocket"
        );
        assert_eq!(
            accepted_message("Designer", "Rocket"),
            "You have been accepted as a Designer for the project: Rocket"
        );
        assert_eq!(
            rejected_message("Designer", "Rocket"),
            "You have been rejected as a Designer for the project: Rocket"
        );
    }
}
