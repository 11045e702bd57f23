use askama::Template;
use axum::{
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use crate::{
    auth::login_required_middleware,
    errors::AppError,
    models::{url_to_readable, Project, ProjectWithPositions, Skill, User},
    state::WebsiteState,
    website::{template_to_response, HtmlResult, Meta, PageContext, TAB_SEARCH},
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/search/your_skills", get(search_your_skills))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .route("/search", get(search))
        .route("/search/skill/{skill}", get(search_by_skill))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    search_term: String,
}

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    term: String,
    message: String,
    projects: Vec<ProjectWithPositions>,
}

pub fn results_message(count: usize, term: &str) -> String {
    if count == 0 {
        format!("No results were found with: {}", term)
    } else {
        format!("{} results were found with: {}", count, term)
    }
}

fn render_results(page: PageContext, term: String, projects: Vec<ProjectWithPositions>) -> HtmlResult {
    template_to_response(&SearchTemplate {
        meta: Meta::with_title("Search"),
        page: page.with_tab(TAB_SEARCH),
        message: results_message(projects.len(), &term),
        term,
        projects,
    })
}

/// An empty term sends the visitor back to the homepage.
async fn search(
    state: State<WebsiteState>,
    page: PageContext,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let term = params.search_term.trim().to_owned();
    if term.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut conn = state.database().acquire().await?;
    let projects = Project::search(&term, &mut conn).await?;
    let projects = ProjectWithPositions::attach(projects, &mut conn).await?;
    tracing::debug!(term = %term, results = projects.len(), "search");

    render_results(page, term, projects).map(IntoResponse::into_response)
}

async fn search_by_skill(
    state: State<WebsiteState>,
    page: PageContext,
    Path(skill): Path<String>,
) -> HtmlResult {
    let name = url_to_readable(&skill);
    let mut conn = state.database().acquire().await?;
    let projects = match Skill::find_by_name(&name, &mut conn).await? {
        Some(skill) => {
            let projects = Project::with_skill(skill.pk, &mut conn).await?;
            ProjectWithPositions::attach(projects, &mut conn).await?
        }
        None => Vec::new(),
    };

    render_results(page, name, projects)
}

async fn search_your_skills(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let projects = Project::with_user_skills(user.pk, &mut conn).await?;
    let projects = ProjectWithPositions::attach(projects, &mut conn).await?;

    render_results(page, "your skills".into(), projects)
}
