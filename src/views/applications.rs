use askama::Template;
use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{get, post},
    Extension, Router,
};

use crate::{
    auth::login_required_middleware,
    errors::AppError,
    models::{
        accepted_message, pending_application_message, rejected_message, Applicant,
        ApplicationDetail, ApplicationStatus, Notification, Position, Project, Skill, User,
    },
    state::WebsiteState,
    website::{
        template_to_response, FormData, HtmlResult, Meta, PageContext, SecureForm,
        TAB_APPLICATIONS,
    },
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/applications", get(applications))
        .route("/applications/request/{pk}", post(applications_request))
        .route(
            "/applications/accept/{position_pk}/{profile_pk}",
            post(applications_accept),
        )
        .route(
            "/applications/reject/{position_pk}/{profile_pk}",
            post(applications_reject),
        )
        .route("/applications/view/accepted", get(applications_view_accepted))
        .route("/applications/view/rejected", get(applications_view_rejected))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "applications/applications.html")]
struct ApplicationsTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    projects: Vec<Project>,
    applications: Vec<ApplicationDetail>,
    needed_skills: Vec<Skill>,
}

async fn applications(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let projects = Project::owned_with_open_positions(user.pk, &mut conn).await?;
    let applications =
        ApplicationDetail::for_owner(user.pk, ApplicationStatus::Pending, &mut conn).await?;
    let needed_skills = Position::open_skills_for_owner(user.pk, &mut conn).await?;

    template_to_response(&ApplicationsTemplate {
        meta: Meta::with_title("Applications"),
        page: page.with_tab(TAB_APPLICATIONS),
        projects,
        applications,
        needed_skills,
    })
}

/// Owners, already filled positions and repeated applications are all answered with a not found.
async fn applications_request(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut tx = state.database().start_transaction().await?;
    let position = Position::get(pk, &mut tx).await?;
    let project = Project::get(position.project_pk, &mut tx).await?;

    if project.owner_pk == user.pk || position.filled() {
        return Err(AppError::DoesNotExist);
    }
    if Applicant::find(user.pk, position.pk, &mut tx).await?.is_some() {
        return Err(AppError::DoesNotExist);
    }

    Applicant::create(user.pk, position.pk, &mut tx).await?;
    position.mark_any_applicants(&mut tx).await?;
    Notification::send(
        project.owner_pk,
        user.pk,
        &pending_application_message(&project.title),
        &mut tx,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(position_pk = position.pk, applicant_pk = user.pk, "application sent");

    Ok(Redirect::to(&format!("/project/view/{}", project.pk)))
}

async fn applications_accept(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path((position_pk, profile_pk)): Path<(i64, i64)>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut tx = state.database().start_transaction().await?;
    let position = Position::get(position_pk, &mut tx).await?;
    let project = Project::get_owned(position.project_pk, user.pk, &mut tx).await?;
    let profile = User::get_by_pk(profile_pk, &mut tx).await?;
    let applicant = Applicant::get(profile.pk, position.pk, &mut tx).await?;

    if position
        .filled_by_pk
        .is_some_and(|filled_by| filled_by != profile.pk)
    {
        return Err(AppError::DoesNotExist);
    }

    applicant.accept(&mut tx).await?;
    position.fill(profile.pk, &mut tx).await?;
    Notification::send(
        profile.pk,
        user.pk,
        &accepted_message(&position.skill_name, &project.title),
        &mut tx,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(position_pk, profile_pk, "applicant accepted");

    Ok(Redirect::to("/applications"))
}

/// Rejecting the applicant currently filling the position opens it again.
async fn applications_reject(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path((position_pk, profile_pk)): Path<(i64, i64)>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut tx = state.database().start_transaction().await?;
    let position = Position::get(position_pk, &mut tx).await?;
    let project = Project::get_owned(position.project_pk, user.pk, &mut tx).await?;
    let profile = User::get_by_pk(profile_pk, &mut tx).await?;
    let applicant = Applicant::get(profile.pk, position.pk, &mut tx).await?;

    applicant.reject(&mut tx).await?;
    if position.filled_by_pk == Some(profile.pk) {
        position.reopen(&mut tx).await?;
    }
    Notification::send(
        profile.pk,
        user.pk,
        &rejected_message(&position.skill_name, &project.title),
        &mut tx,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(position_pk, profile_pk, "applicant rejected");

    Ok(Redirect::to("/applications"))
}

#[derive(Template)]
#[template(path = "applications/applications_status.html")]
struct ApplicationsStatusTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    heading: &'static str,
    accepted: bool,
    applications: Vec<ApplicationDetail>,
}

async fn render_status(
    state: &WebsiteState,
    page: PageContext,
    user: &User,
    status: ApplicationStatus,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let applications = ApplicationDetail::for_owner(user.pk, status, &mut conn).await?;
    let accepted = status == ApplicationStatus::Accepted;
    let heading = if accepted {
        "Accepted applications"
    } else {
        "Rejected applications"
    };

    template_to_response(&ApplicationsStatusTemplate {
        meta: Meta::with_title(heading),
        page: page.with_tab(TAB_APPLICATIONS),
        heading,
        accepted,
        applications,
    })
}

async fn applications_view_accepted(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    render_status(&state, page, &user, ApplicationStatus::Accepted).await
}

async fn applications_view_rejected(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    render_status(&state, page, &user, ApplicationStatus::Rejected).await
}
