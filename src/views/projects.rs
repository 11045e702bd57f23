use askama::Template;
use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use validator::Validate;

use crate::{
    auth::login_required_middleware,
    errors::AppError,
    models::{
        Applicant, NewPosition, Position, Project, ProjectForm, ProjectWithPositions, Skill, User,
    },
    state::WebsiteState,
    website::{
        template_to_response, FormData, FormErrors, HtmlResult, Meta, PageContext,
        PositionsFormset, SecureForm, TAB_PROJECTS,
    },
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/project/new", get(project_new).post(post_project_new))
        .route("/project/edit/{pk}", get(project_edit).post(post_project_edit))
        .route(
            "/project/delete_confirmation/{pk}",
            get(project_delete_confirmation).post(post_project_delete_confirmation),
        )
        .route("/project/delete/{pk}", post(project_delete))
        .route("/project/view_all", get(project_view_all))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .route("/project/view/{pk}", get(project_view))
        .with_state(state)
}

fn project_form(data: &FormData) -> ProjectForm {
    ProjectForm {
        title: data.get_or_empty("title").trim().to_owned(),
        description: data.get_or_empty("description").trim().to_owned(),
        time_line: data.get_or_empty("time_line").trim().to_owned(),
        requirements: data.get_or_empty("requirements").trim().to_owned(),
    }
}

/// Validates the project fields and the positions formset together.
fn clean_submission(
    form: &ProjectForm,
    formset: &mut PositionsFormset,
    skills: &[Skill],
) -> Result<Vec<NewPosition>, FormErrors> {
    let errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(e) => FormErrors::from(e),
    };
    match formset.clean(skills) {
        Some(positions) if errors.is_empty() => Ok(positions),
        Some(_) => Err(errors),
        None => {
            let mut errors = errors;
            errors.add_non_field("Please correct the errors in the positions below.");
            Err(errors)
        }
    }
}

#[derive(Template)]
#[template(path = "projects/project_form.html")]
struct ProjectFormTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    heading: &'static str,
    action: String,
    form: ProjectForm,
    formset: PositionsFormset,
    filled_positions: Vec<Position>,
    skills: Vec<Skill>,
    errors: FormErrors,
}

async fn project_new(state: State<WebsiteState>, page: PageContext) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let skills = Skill::all_sorted(&mut conn).await?;

    template_to_response(&ProjectFormTemplate {
        meta: Meta::with_title("New project"),
        page: page.with_tab(TAB_PROJECTS),
        heading: "New project",
        action: "/project/new".into(),
        form: ProjectForm::default(),
        formset: PositionsFormset::default().with_blank_row(),
        filled_positions: Vec::new(),
        skills,
        errors: FormErrors::default(),
    })
}

async fn post_project_new(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
    SecureForm(data): SecureForm<FormData>,
) -> Result<Response, AppError> {
    let skills = {
        let mut conn = state.database().acquire().await?;
        Skill::all_sorted(&mut conn).await?
    };
    let form = project_form(&data);
    let mut formset = PositionsFormset::from_form(&data);

    let positions = match clean_submission(&form, &mut formset, &skills) {
        Ok(positions) => positions,
        Err(errors) => {
            return template_to_response(&ProjectFormTemplate {
                meta: Meta::with_title("New project"),
                page: page.with_tab(TAB_PROJECTS),
                heading: "New project",
                action: "/project/new".into(),
                form,
                formset: formset.with_blank_row(),
                filled_positions: Vec::new(),
                skills,
                errors,
            })
            .map(IntoResponse::into_response)
        }
    };

    let mut tx = state.database().start_transaction().await?;
    let project_pk = Project::create(user.pk, &form, &mut tx).await?;
    for position in &positions {
        Position::create(project_pk, position, &mut tx).await?;
    }
    tx.commit().await?;
    tracing::info!(project_pk, owner_pk = user.pk, "project created");

    Ok(Redirect::to(&format!("/project/view/{}", project_pk)).into_response())
}

async fn project_edit(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let project = Project::get_owned(pk, user.pk, &mut conn).await?;
    let positions = Position::for_project(project.pk, &mut conn).await?;
    let skills = Skill::all_sorted(&mut conn).await?;

    let formset = PositionsFormset::from_positions(positions.iter().filter(|p| !p.filled()));
    let filled_positions = positions.into_iter().filter(|p| p.filled()).collect();

    template_to_response(&ProjectFormTemplate {
        meta: Meta::with_title("Edit project"),
        page: page.with_tab(TAB_PROJECTS),
        heading: "Edit project",
        action: format!("/project/edit/{}", project.pk),
        form: ProjectForm::from(&project),
        formset: formset.with_blank_row(),
        filled_positions,
        skills,
        errors: FormErrors::default(),
    })
}

async fn post_project_edit(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(data): SecureForm<FormData>,
) -> Result<Response, AppError> {
    let (project, skills, filled_positions) = {
        let mut conn = state.database().acquire().await?;
        let project = Project::get_owned(pk, user.pk, &mut conn).await?;
        let skills = Skill::all_sorted(&mut conn).await?;
        let filled: Vec<Position> = Position::for_project(project.pk, &mut conn)
            .await?
            .into_iter()
            .filter(|p| p.filled())
            .collect();
        (project, skills, filled)
    };

    let form = project_form(&data);
    let mut formset = PositionsFormset::from_form(&data);

    let positions = match clean_submission(&form, &mut formset, &skills) {
        Ok(positions) => positions,
        Err(errors) => {
            return template_to_response(&ProjectFormTemplate {
                meta: Meta::with_title("Edit project"),
                page: page.with_tab(TAB_PROJECTS),
                heading: "Edit project",
                action: format!("/project/edit/{}", project.pk),
                form,
                formset: formset.with_blank_row(),
                filled_positions,
                skills,
                errors,
            })
            .map(IntoResponse::into_response)
        }
    };

    let mut tx = state.database().start_transaction().await?;
    project.update(&form, &mut tx).await?;
    Position::sync_open(project.pk, &positions, &mut tx).await?;
    tx.commit().await?;
    tracing::info!(project_pk = project.pk, "project updated");

    Ok(Redirect::to(&format!("/project/view/{}", project.pk)).into_response())
}

#[derive(Template)]
#[template(path = "projects/project_delete.html")]
struct ProjectDeleteTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    project: Project,
}

async fn project_delete_confirmation(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let project = Project::get_owned(pk, user.pk, &mut conn).await?;

    template_to_response(&ProjectDeleteTemplate {
        meta: Meta::with_title("Delete project"),
        page: page.with_tab(TAB_PROJECTS),
        project,
    })
}

/// `delete` removes the project, anything else goes back to the edit page.
async fn post_project_delete_confirmation(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(data): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut conn = state.database().acquire().await?;
    let project = Project::get_owned(pk, user.pk, &mut conn).await?;

    if data.get("delete").is_some() {
        project.delete(&mut conn).await?;
        Ok(Redirect::to("/"))
    } else {
        Ok(Redirect::to(&format!("/project/edit/{}", project.pk)))
    }
}

async fn project_delete(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut conn = state.database().acquire().await?;
    Project::get_owned(pk, user.pk, &mut conn)
        .await?
        .delete(&mut conn)
        .await?;
    Ok(Redirect::to("/"))
}

pub struct PublicPosition {
    pub position: Position,
    pub applied: bool,
    pub can_apply: bool,
}

#[derive(Template)]
#[template(path = "projects/project_owner.html")]
struct ProjectOwnerTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    project: Project,
    positions: Vec<Position>,
}

#[derive(Template)]
#[template(path = "projects/project.html")]
struct ProjectTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    project: Project,
    positions: Vec<PublicPosition>,
}

async fn project_view(
    state: State<WebsiteState>,
    page: PageContext,
    Path(pk): Path<i64>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let ProjectWithPositions { project, positions } =
        ProjectWithPositions::load(pk, &mut conn).await?;

    if project.is_owned_by(page.user_pk()) {
        return template_to_response(&ProjectOwnerTemplate {
            meta: Meta::with_title(project.title.clone()),
            page: page.with_tab(TAB_PROJECTS),
            project,
            positions,
        });
    }

    let applied = match page.user_pk() {
        Some(user_pk) => Applicant::position_pks_for_user(user_pk, &mut conn).await?,
        None => Vec::new(),
    };
    let authenticated = page.is_authenticated();
    let positions = positions
        .into_iter()
        .map(|position| {
            let applied = applied.contains(&position.pk);
            PublicPosition {
                can_apply: authenticated && !applied && !position.filled(),
                applied,
                position,
            }
        })
        .collect();

    template_to_response(&ProjectTemplate {
        meta: Meta::with_title(project.title.clone()),
        page: page.with_tab(TAB_PROJECTS),
        project,
        positions,
    })
}

#[derive(Template)]
#[template(path = "projects/project_view_all.html")]
struct ProjectViewAllTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    projects: Vec<ProjectWithPositions>,
    needed_skills: Vec<Skill>,
}

async fn project_view_all(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let projects = Project::owned_by(user.pk, &mut conn).await?;
    let projects = ProjectWithPositions::attach(projects, &mut conn).await?;
    let needed_skills = Position::open_skills_for_owner(user.pk, &mut conn).await?;

    template_to_response(&ProjectViewAllTemplate {
        meta: Meta::with_title("Your projects"),
        page: page.with_tab(TAB_PROJECTS),
        projects,
        needed_skills,
    })
}
