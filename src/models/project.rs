use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use sqlx::{prelude::FromRow, QueryBuilder, Sqlite, SqliteConnection};
use validator::Validate;

use crate::errors::AppError;

use super::{readable_to_url, Skill};

const PROJECT_SELECT: &str = "SELECT DISTINCT projects.pk, projects.owner_pk, users.username AS owner_username,
        projects.title, projects.description, projects.time_line, projects.requirements, projects.created_at
    FROM projects
    INNER JOIN users ON users.pk = projects.owner_pk";

const POSITION_SELECT: &str = "SELECT positions.pk, positions.project_pk, positions.skill_pk, skills.name AS skill_name,
        positions.information, positions.time_commitment, positions.any_applicants, positions.filled_by_pk,
        users.username AS filled_by_username,
        (SELECT COUNT(*) FROM applicants
            WHERE applicants.position_pk = positions.pk AND applicants.accepted = 0 AND applicants.rejected = 0
        ) AS pending_applicants
    FROM positions
    INNER JOIN skills ON skills.pk = positions.skill_pk
    LEFT JOIN users ON users.pk = positions.filled_by_pk";

#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub pk: i64,
    pub owner_pk: i64,
    pub owner_username: String,
    pub title: String,
    pub description: String,
    pub time_line: String,
    pub requirements: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct ProjectForm {
    #[validate(length(min = 1, max = 60, message = "The title must have between 1 and 60 characters."))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 1000,
        message = "The description must have between 1 and 1000 characters."
    ))]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "The time line must have between 1 and 50 characters."))]
    pub time_line: String,
    #[validate(length(
        min = 1,
        max = 150,
        message = "The requirements must have between 1 and 150 characters."
    ))]
    pub requirements: String,
}

impl From<&Project> for ProjectForm {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            time_line: project.time_line.clone(),
            requirements: project.requirements.clone(),
        }
    }
}

impl Project {
    pub async fn create(
        owner_pk: i64,
        form: &ProjectForm,
        conn: &mut SqliteConnection,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "INSERT INTO projects (owner_pk, title, description, time_line, requirements, created_at)
                VALUES ($1, $2, $3, $4, $5, $6) RETURNING pk;",
        )
        .bind(owner_pk)
        .bind(&form.title)
        .bind(&form.description)
        .bind(&form.time_line)
        .bind(&form.requirements)
        .bind(Utc::now().naive_utc())
        .fetch_one(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn update(&self, form: &ProjectForm, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE projects SET title = $1, description = $2, time_line = $3, requirements = $4 WHERE pk = $5;",
        )
        .bind(&form.title)
        .bind(&form.description)
        .bind(&form.time_line)
        .bind(&form.requirements)
        .bind(self.pk)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Positions and their applicants go with the project.
    pub async fn delete(self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("DELETE FROM projects WHERE pk = $1;")
            .bind(self.pk)
            .execute(conn)
            .await?;
        tracing::info!(project_pk = self.pk, "project deleted");
        Ok(())
    }

    pub async fn get(pk: i64, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query_as(&format!("{} WHERE projects.pk = $1;", PROJECT_SELECT))
            .bind(pk)
            .fetch_optional(conn)
            .await?
            .ok_or(AppError::DoesNotExist)
    }

    pub async fn get_owned(
        pk: i64,
        owner_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Self, AppError> {
        let project = Self::get(pk, conn).await?;
        if project.owner_pk != owner_pk {
            return Err(AppError::NotOwner);
        }
        Ok(project)
    }

    pub fn is_owned_by(&self, user_pk: Option<i64>) -> bool {
        user_pk == Some(self.owner_pk)
    }

    pub async fn all(conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!("{} ORDER BY projects.pk DESC;", PROJECT_SELECT))
            .fetch_all(conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn owned_by(owner_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} WHERE projects.owner_pk = $1 ORDER BY projects.pk DESC;",
            PROJECT_SELECT
        ))
        .bind(owner_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    /// Projects of `owner_pk` that still have at least one open position.
    pub async fn owned_with_open_positions(
        owner_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} INNER JOIN positions ON positions.project_pk = projects.pk
                WHERE projects.owner_pk = $1 AND positions.filled_by_pk IS NULL
                ORDER BY projects.pk DESC;",
            PROJECT_SELECT
        ))
        .bind(owner_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    /// Case insensitive substring match over the project texts and its positions.
    pub async fn search(term: &str, conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        let pattern = format!("%{}%", escape_like(term.trim()));
        sqlx::query_as(&format!(
            r"{} LEFT JOIN positions ON positions.project_pk = projects.pk
                WHERE projects.title LIKE $1 ESCAPE '\'
                    OR projects.time_line LIKE $1 ESCAPE '\'
                    OR projects.requirements LIKE $1 ESCAPE '\'
                    OR projects.description LIKE $1 ESCAPE '\'
                    OR positions.information LIKE $1 ESCAPE '\'
                ORDER BY projects.pk DESC;",
            PROJECT_SELECT
        ))
        .bind(pattern)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn with_skill(skill_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} INNER JOIN positions ON positions.project_pk = projects.pk
                WHERE positions.skill_pk = $1
                ORDER BY projects.pk DESC;",
            PROJECT_SELECT
        ))
        .bind(skill_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn with_user_skills(
        user_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} INNER JOIN positions ON positions.project_pk = projects.pk
                INNER JOIN all_skills ON all_skills.skill_pk = positions.skill_pk
                WHERE all_skills.user_pk = $1
                ORDER BY projects.pk DESC;",
            PROJECT_SELECT
        ))
        .bind(user_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Position {
    pub pk: i64,
    pub project_pk: i64,
    pub skill_pk: i64,
    pub skill_name: String,
    pub information: String,
    pub time_commitment: String,
    pub any_applicants: bool,
    pub filled_by_pk: Option<i64>,
    pub filled_by_username: Option<String>,
    pub pending_applicants: i64,
}

/// A validated formset row, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub skill_pk: i64,
    pub information: String,
    pub time_commitment: String,
}

impl Position {
    pub fn skill_url_name(&self) -> String {
        readable_to_url(&self.skill_name)
    }

    pub fn filled(&self) -> bool {
        self.filled_by_pk.is_some()
    }

    fn matches(&self, row: &NewPosition) -> bool {
        self.skill_pk == row.skill_pk
            && self.information == row.information
            && self.time_commitment == row.time_commitment
    }

    pub async fn get(pk: i64, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        sqlx::query_as(&format!("{} WHERE positions.pk = $1;", POSITION_SELECT))
            .bind(pk)
            .fetch_optional(conn)
            .await?
            .ok_or(AppError::DoesNotExist)
    }

    pub async fn for_project(
        project_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(&format!(
            "{} WHERE positions.project_pk = $1 ORDER BY positions.pk;",
            POSITION_SELECT
        ))
        .bind(project_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }

    async fn for_projects(
        project_pks: &[i64],
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        if project_pks.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(POSITION_SELECT);
        query_builder.push(" WHERE positions.project_pk IN (");
        let mut separated = query_builder.separated(", ");
        for pk in project_pks {
            separated.push_bind(*pk);
        }
        separated.push_unseparated(") ORDER BY positions.pk;");

        query_builder
            .build_query_as()
            .fetch_all(conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn create(
        project_pk: i64,
        row: &NewPosition,
        conn: &mut SqliteConnection,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "INSERT INTO positions (project_pk, skill_pk, information, time_commitment) VALUES ($1, $2, $3, $4) RETURNING pk;",
        )
        .bind(project_pk)
        .bind(row.skill_pk)
        .bind(&row.information)
        .bind(&row.time_commitment)
        .fetch_one(conn)
        .await
        .map_err(AppError::from)
    }

    /// Rewrites the open positions of a project from the submitted rows.
    /// Filled positions are never touched. Open positions matching a row are kept,
    /// the other open positions are removed and the unmatched rows are created.
    pub async fn sync_open(
        project_pk: i64,
        rows: &[NewPosition],
        conn: &mut SqliteConnection,
    ) -> Result<(), AppError> {
        let open: Vec<Self> = Self::for_project(project_pk, &mut *conn)
            .await?
            .into_iter()
            .filter(|p| !p.filled())
            .collect();

        let mut kept: Vec<i64> = Vec::new();
        let mut to_create: Vec<&NewPosition> = Vec::new();
        for row in rows {
            match open
                .iter()
                .find(|p| !kept.contains(&p.pk) && p.matches(row))
            {
                Some(position) => kept.push(position.pk),
                None => to_create.push(row),
            }
        }

        for position in open.iter().filter(|p| !kept.contains(&p.pk)) {
            sqlx::query("DELETE FROM positions WHERE pk = $1 AND filled_by_pk IS NULL;")
                .bind(position.pk)
                .execute(&mut *conn)
                .await?;
        }

        for row in to_create {
            Self::create(project_pk, row, &mut *conn).await?;
        }
        Ok(())
    }

    pub async fn mark_any_applicants(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("UPDATE positions SET any_applicants = 1 WHERE pk = $1;")
            .bind(self.pk)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn fill(&self, user_pk: i64, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("UPDATE positions SET filled_by_pk = $1 WHERE pk = $2;")
            .bind(user_pk)
            .bind(self.pk)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn reopen(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("UPDATE positions SET filled_by_pk = NULL WHERE pk = $1;")
            .bind(self.pk)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Distinct skills still needed by the open positions of the owner's projects.
    pub async fn open_skills_for_owner(
        owner_pk: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Skill>, AppError> {
        sqlx::query_as(
            "SELECT DISTINCT skills.pk, skills.name FROM skills
                INNER JOIN positions ON positions.skill_pk = skills.pk
                INNER JOIN projects ON projects.pk = positions.project_pk
                WHERE projects.owner_pk = $1 AND positions.filled_by_pk IS NULL
                ORDER BY skills.name;",
        )
        .bind(owner_pk)
        .fetch_all(conn)
        .await
        .map_err(AppError::from)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectWithPositions {
    pub project: Project,
    pub positions: Vec<Position>,
}

impl ProjectWithPositions {
    pub async fn load(pk: i64, conn: &mut SqliteConnection) -> Result<Self, AppError> {
        let project = Project::get(pk, &mut *conn).await?;
        let positions = Position::for_project(pk, conn).await?;
        Ok(Self { project, positions })
    }

    /// Attaches the positions to every project with a single query.
    pub async fn attach(
        projects: Vec<Project>,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Self>, AppError> {
        let pks: Vec<i64> = projects.iter().map(|p| p.pk).collect();
        let mut by_project: HashMap<i64, Vec<Position>> = HashMap::new();
        for position in Position::for_projects(&pks, conn).await? {
            by_project
                .entry(position.project_pk)
                .or_default()
                .push(position);
        }

        Ok(projects
            .into_iter()
            .map(|project| Self {
                positions: by_project.remove(&project.pk).unwrap_or_default(),
                project,
            })
            .collect())
    }
}

/// Escapes the LIKE wildcards so the term is matched literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
