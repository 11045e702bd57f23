use chrono::{NaiveDateTime, Utc};
use sqlx::{prelude::FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::errors::AppError;

#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct Skill {
    pub pk: i64,
    pub name: String,
}

impl Skill {
    /// Path segment used by the search-by-skill page.
    pub fn url_name(&self) -> String {
        readable_to_url(&self.name)
    }

    pub async fn all_sorted(conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        sqlx::query_as("SELECT pk, name FROM skills ORDER BY name;")
            .fetch_all(conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_name(
        name: &str,
        conn: &mut SqliteConnection,
    ) -> Result<Option<Self>, AppError> {
        sqlx::query_as("SELECT pk, name FROM skills WHERE name = $1;")
            .bind(name)
            .fetch_optional(conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn get_or_create(name: &str, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query("INSERT INTO skills (name) VALUES ($1) ON CONFLICT (name) DO NOTHING;")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        Self::find_by_name(name, conn)
            .await?
            .ok_or(AppError::DoesNotExist)
    }
}

/// The skill set of a single user.
pub struct AllSkills;

impl AllSkills {
    pub async fn for_user(user_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<Skill>, AppError> {
        sqlx::query_as(
            "SELECT skills.pk, skills.name FROM skills
                INNER JOIN all_skills ON all_skills.skill_pk = skills.pk
                WHERE all_skills.user_pk = $1
                ORDER BY skills.name;",
        )
        .bind(user_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn add(user_pk: i64, skill_pk: i64, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO all_skills (user_pk, skill_pk) VALUES ($1, $2);")
            .bind(user_pk)
            .bind(skill_pk)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Replaces the skill set with `skill_pks`, unknown pks are ignored.
    pub async fn replace(
        user_pk: i64,
        skill_pks: &[i64],
        conn: &mut SqliteConnection,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM all_skills WHERE user_pk = $1;")
            .bind(user_pk)
            .execute(&mut *conn)
            .await?;

        if skill_pks.is_empty() {
            return Ok(());
        }

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT OR IGNORE INTO all_skills (user_pk, skill_pk) SELECT ");
        query_builder.push_bind(user_pk);
        query_builder.push(", pk FROM skills WHERE pk IN (");
        let mut separated = query_builder.separated(", ");
        for pk in skill_pks {
            separated.push_bind(*pk);
        }
        separated.push_unseparated(");");

        query_builder.build().execute(conn).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SkillConfirmation {
    pub pk: i64,
    pub skill: String,
    pub creator_pk: i64,
    pub creator_username: String,
    pub pending: bool,
    pub accepted: bool,
    pub created_at: NaiveDateTime,
}

const CONFIRMATION_SELECT: &str = "SELECT skill_confirmations.pk, skill_confirmations.skill, skill_confirmations.creator_pk,
        users.username AS creator_username, skill_confirmations.pending, skill_confirmations.accepted,
        skill_confirmations.created_at
    FROM skill_confirmations
    INNER JOIN users ON users.pk = skill_confirmations.creator_pk";

impl SkillConfirmation {
    pub async fn create(
        skill: &str,
        creator_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<i64, AppError> {
        sqlx::query(
            "INSERT INTO skill_confirmations (skill, creator_pk, pending, accepted, created_at) VALUES ($1, $2, 1, 0, $3);",
        )
        .bind(skill)
        .bind(creator_pk)
        .bind(Utc::now().naive_utc())
        .execute(conn)
        .await
        .map(|r| r.last_insert_rowid())
        .map_err(AppError::from)
    }

    pub async fn pending(conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} WHERE skill_confirmations.pending = 1 ORDER BY skill_confirmations.pk;",
            CONFIRMATION_SELECT
        ))
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn resolved(conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} WHERE skill_confirmations.pending = 0 ORDER BY skill_confirmations.pk DESC;",
            CONFIRMATION_SELECT
        ))
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn for_creator(
        creator_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} WHERE skill_confirmations.creator_pk = $1 ORDER BY skill_confirmations.pk DESC;",
            CONFIRMATION_SELECT
        ))
        .bind(creator_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    /// Only pending requests can be looked up for resolution.
    pub async fn get_pending(pk: i64, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query_as(&format!(
            "{} WHERE skill_confirmations.pk = $1 AND skill_confirmations.pending = 1;",
            CONFIRMATION_SELECT
        ))
        .bind(pk)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::DoesNotExist)
    }

    pub async fn resolve(
        mut self,
        accepted: bool,
        conn: &mut SqliteConnection,
    ) -> Result<Self, AppError> {
        let result = sqlx::query(
            "UPDATE skill_confirmations SET pending = 0, accepted = $1 WHERE pk = $2 AND pending = 1;",
        )
        .bind(accepted)
        .bind(self.pk)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::DoesNotExist);
        }
        self.pending = false;
        self.accepted = accepted;
        Ok(self)
    }
}

pub fn readable_to_url(skill: &str) -> String {
    skill.trim().replace(' ', "_")
}

pub fn url_to_readable(skill: &str) -> String {
    skill.replace('_', " ")
}
