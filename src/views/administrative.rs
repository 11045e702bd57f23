use askama::Template;
use axum::{
    extract::{Path, State},
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::{get, post},
    Extension, Router,
};

use crate::{
    auth::{login_required_middleware, staff_required_middleware},
    errors::AppError,
    models::{
        skill_accepted_message, skill_denied_message, AllSkills, Notification, Skill,
        SkillConfirmation, User,
    },
    state::WebsiteState,
    website::{
        template_to_response, FormData, HtmlResult, Meta, PageContext, SecureForm,
        TAB_ADMINISTRATIVE,
    },
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/administrative", get(administrative))
        .route("/administrative/non_pending", get(administrative_non_pending))
        .route("/administrative/skill_accept/{pk}", post(skill_accept))
        .route("/administrative/skill_deny/{pk}", post(skill_deny))
        .route_layer(from_fn(staff_required_middleware))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "administrative/administrative.html")]
struct AdministrativeTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    pending: bool,
    tasks: Vec<SkillConfirmation>,
}

async fn administrative(state: State<WebsiteState>, page: PageContext) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let tasks = SkillConfirmation::pending(&mut conn).await?;

    template_to_response(&AdministrativeTemplate {
        meta: Meta::with_title("Administrative"),
        page: page.with_tab(TAB_ADMINISTRATIVE),
        pending: true,
        tasks,
    })
}

async fn administrative_non_pending(state: State<WebsiteState>, page: PageContext) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let tasks = SkillConfirmation::resolved(&mut conn).await?;

    template_to_response(&AdministrativeTemplate {
        meta: Meta::with_title("Administrative"),
        page: page.with_tab(TAB_ADMINISTRATIVE),
        pending: false,
        tasks,
    })
}

/// Adds the requested skill to the catalog and to the requester's skills.
async fn skill_accept(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut tx = state.database().start_transaction().await?;
    let confirmation = SkillConfirmation::get_pending(pk, &mut tx).await?;
    let skill = Skill::get_or_create(confirmation.skill.trim(), &mut tx).await?;
    AllSkills::add(confirmation.creator_pk, skill.pk, &mut tx).await?;
    let confirmation = confirmation.resolve(true, &mut tx).await?;
    Notification::send(
        confirmation.creator_pk,
        user.pk,
        &skill_accepted_message(&skill.name),
        &mut tx,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(confirmation_pk = pk, skill = %skill.name, "skill request accepted");

    Ok(Redirect::to("/administrative"))
}

async fn skill_deny(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut tx = state.database().start_transaction().await?;
    let confirmation = SkillConfirmation::get_pending(pk, &mut tx)
        .await?
        .resolve(false, &mut tx)
        .await?;
    Notification::send(
        confirmation.creator_pk,
        user.pk,
        &skill_denied_message(&confirmation.skill),
        &mut tx,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(confirmation_pk = pk, "skill request denied");

    Ok(Redirect::to("/administrative"))
}
