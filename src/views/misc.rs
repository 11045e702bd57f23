use askama::Template;
use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::Redirect,
    routing::get,
    Extension, Router,
};

use crate::{
    auth::login_required_middleware,
    errors::AppError,
    models::{AllSkills, Project, ProjectWithPositions, Skill, User},
    state::WebsiteState,
    website::{template_to_response, HtmlResult, Meta, PageContext, TAB_HOME},
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/login_router", get(login_router))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .route("/", get(homepage))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    projects: Vec<ProjectWithPositions>,
    skills: Vec<Skill>,
}

async fn homepage(state: State<WebsiteState>, page: PageContext) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let projects = Project::all(&mut conn).await?;
    let projects = ProjectWithPositions::attach(projects, &mut conn).await?;
    let skills = Skill::all_sorted(&mut conn).await?;

    template_to_response(&HomeTemplate {
        meta: Meta::default(),
        page: page.with_tab(TAB_HOME),
        projects,
        skills,
    })
}

/// New users without a bio nor skills land on the profile form.
async fn login_router(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
) -> Result<Redirect, AppError> {
    let mut conn = state.database().acquire().await?;
    let skills = AllSkills::for_user(user.pk, &mut conn).await?;

    if user.bio.trim().is_empty() && skills.is_empty() {
        Ok(Redirect::to("/profile/edit"))
    } else {
        Ok(Redirect::to(&format!("/profile/view/{}", user.pk)))
    }
}
