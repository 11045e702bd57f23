use chrono::{NaiveDateTime, Utc};
use sqlx::{prelude::FromRow, SqliteConnection};

use crate::errors::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct Applicant {
    pub pk: i64,
    pub applicant_pk: i64,
    pub position_pk: i64,
    pub accepted: bool,
    pub rejected: bool,
    pub created_at: NaiveDateTime,
}

impl Applicant {
    pub async fn find(
        applicant_pk: i64,
        position_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Option<Self>, AppError> {
        sqlx::query_as(
            "SELECT pk, applicant_pk, position_pk, accepted, rejected, created_at
                FROM applicants WHERE applicant_pk = $1 AND position_pk = $2;",
        )
        .bind(applicant_pk)
        .bind(position_pk)
        .fetch_optional(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn get(
        applicant_pk: i64,
        position_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Self, AppError> {
        Self::find(applicant_pk, position_pk, conn)
            .await?
            .ok_or(AppError::DoesNotExist)
    }

    /// A second application to the same position is reported as missing.
    pub async fn create(
        applicant_pk: i64,
        position_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Self, AppError> {
        sqlx::query_as(
            "INSERT INTO applicants (applicant_pk, position_pk, accepted, rejected, created_at)
                VALUES ($1, $2, 0, 0, $3)
                RETURNING pk, applicant_pk, position_pk, accepted, rejected, created_at;",
        )
        .bind(applicant_pk)
        .bind(position_pk)
        .bind(Utc::now().naive_utc())
        .fetch_one(conn)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => AppError::DoesNotExist,
            _ => AppError::from(e),
        })
    }

    pub async fn accept(mut self, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query("UPDATE applicants SET accepted = 1, rejected = 0 WHERE pk = $1;")
            .bind(self.pk)
            .execute(conn)
            .await?;
        self.accepted = true;
        self.rejected = false;
        Ok(self)
    }

    pub async fn reject(mut self, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query("UPDATE applicants SET accepted = 0, rejected = 1 WHERE pk = $1;")
            .bind(self.pk)
            .execute(conn)
            .await?;
        self.accepted = false;
        self.rejected = true;
        Ok(self)
    }

    pub async fn position_pks_for_user(
        applicant_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<i64>, AppError> {
        sqlx::query_scalar("SELECT position_pk FROM applicants WHERE applicant_pk = $1;")
            .bind(applicant_pk)
            .fetch_all(conn)
            .await
            .map_err(AppError::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    fn condition(&self) -> &'static str {
        match self {
            Self::Pending => {
                "applicants.accepted = 0 AND applicants.rejected = 0 AND positions.filled_by_pk IS NULL"
            }
            Self::Accepted => "applicants.accepted = 1 AND positions.filled_by_pk IS NOT NULL",
            Self::Rejected => "applicants.rejected = 1",
        }
    }
}

/// An application as seen by the owner of the project.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationDetail {
    pub applicant_pk: i64,
    pub applicant_username: String,
    pub position_pk: i64,
    pub skill_name: String,
    pub information: String,
    pub project_pk: i64,
    pub project_title: String,
    pub accepted: bool,
    pub rejected: bool,
}

impl ApplicationDetail {
    pub async fn for_owner(
        owner_pk: i64,
        status: ApplicationStatus,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "SELECT applicants.applicant_pk, users.username AS applicant_username, positions.pk AS position_pk,
                    skills.name AS skill_name, positions.information, projects.pk AS project_pk,
                    projects.title AS project_title, applicants.accepted, applicants.rejected
                FROM applicants
                INNER JOIN users ON users.pk = applicants.applicant_pk
                INNER JOIN positions ON positions.pk = applicants.position_pk
                INNER JOIN skills ON skills.pk = positions.skill_pk
                INNER JOIN projects ON projects.pk = positions.project_pk
                WHERE projects.owner_pk = $1 AND {}
                ORDER BY applicants.pk;",
            status.condition()
        ))
        .bind(owner_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }
}
