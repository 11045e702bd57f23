use std::{borrow::Cow, sync::LazyLock};

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    middleware::from_fn_with_state,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use bytes::Bytes;
use regex::Regex;
use validator::{Validate, ValidationError};

use crate::{
    auth::login_required_middleware,
    errors::AppError,
    models::{
        AllSkills, ProfileChanges, Project, ProjectWithPositions, Skill, SkillConfirmation, User,
    },
    sessions::Session,
    state::WebsiteState,
    website::{
        check_csrf, remove_avatar, save_avatar, template_to_response, FormData, FormErrors, HtmlResult, Meta,
        PageContext, TAB_PROFILE,
    },
};

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/profile/edit", get(profile_edit).post(post_profile_edit))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .route("/profile/view/{pk}", get(profile_view))
        .with_state(state)
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    if COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::new("color")
            .with_message(Cow::Borrowed("Enter a color like #4A90E2.")))
    }
}

#[derive(Debug, Default, Validate)]
pub struct ProfileForm {
    #[validate(length(
        min = 1,
        max = 100,
        message = "The username must have between 1 and 100 characters."
    ))]
    pub username: String,
    #[validate(length(max = 250, message = "The bio can have at most 250 characters."))]
    pub bio: String,
    #[validate(custom(function = "validate_color"))]
    pub color: String,
    #[validate(length(max = 100, message = "The skill can have at most 100 characters."))]
    pub new_skill: String,
    pub skills: Vec<i64>,
}

impl ProfileForm {
    fn from_form(form: &FormData) -> Self {
        Self {
            username: form.get_or_empty("username").trim().to_owned(),
            bio: form.get_or_empty("bio").trim().to_owned(),
            color: form.get_or_empty("color").trim().to_owned(),
            new_skill: form.get_or_empty("new_skill").trim().to_owned(),
            skills: form
                .get_all("skills")
                .into_iter()
                .filter_map(|pk| pk.trim().parse().ok())
                .collect(),
        }
    }

    fn from_user(user: &User, skills: &[Skill]) -> Self {
        Self {
            username: user.username.clone(),
            bio: user.bio.clone(),
            color: user.color.clone(),
            new_skill: String::new(),
            skills: skills.iter().map(|s| s.pk).collect(),
        }
    }
}

pub struct SkillChoice {
    pub skill: Skill,
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "profiles/profile_edit.html")]
struct ProfileEditTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    user: User,
    form: ProfileForm,
    choices: Vec<SkillChoice>,
    requests: Vec<SkillConfirmation>,
    errors: FormErrors,
}

async fn render_profile_edit(
    state: &WebsiteState,
    page: PageContext,
    user: User,
    form: ProfileForm,
    errors: FormErrors,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let choices = Skill::all_sorted(&mut conn)
        .await?
        .into_iter()
        .map(|skill| SkillChoice {
            checked: form.skills.contains(&skill.pk),
            skill,
        })
        .collect();
    let requests = SkillConfirmation::for_creator(user.pk, &mut conn).await?;

    template_to_response(&ProfileEditTemplate {
        meta: Meta::with_title("Edit profile"),
        page: page.with_tab(TAB_PROFILE),
        user,
        form,
        choices,
        requests,
        errors,
    })
}

async fn profile_edit(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    let skills = {
        let mut conn = state.database().acquire().await?;
        AllSkills::for_user(user.pk, &mut conn).await?
    };
    let form = ProfileForm::from_user(&user, &skills);
    render_profile_edit(&state, page, user, form, FormErrors::default()).await
}

async fn post_profile_edit(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(session): Extension<Session>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut data = FormData::default();
    let mut avatar: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "avatar" {
            let has_file = field.file_name().is_some_and(|f| !f.is_empty());
            let bytes = field.bytes().await?;
            if has_file && !bytes.is_empty() {
                avatar = Some(bytes);
            }
        } else {
            let value = field.text().await?;
            data.push(name, value);
        }
    }

    check_csrf(&session, &state, data.get("csrf_token").unwrap_or_default()).await?;

    let form = ProfileForm::from_form(&data);
    let mut errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(e) => e.into(),
    };

    let media_root = state.config().media_root();
    let avatar_url = match avatar {
        Some(bytes) if errors.is_empty() => match save_avatar(&media_root, user.pk, bytes).await {
            Ok(url) => Some(url),
            Err(AppError::Image(e)) => {
                tracing::debug!(error = %e, "invalid avatar upload");
                errors.add("avatar", "Upload a valid image.");
                None
            }
            Err(e) => return Err(e),
        },
        _ => None,
    };

    if !errors.is_empty() {
        return render_profile_edit(&state, page, user, form, errors)
            .await
            .map(IntoResponse::into_response);
    }

    if let Err(e) = save_profile(&state, &user, &form, avatar_url.as_deref()).await {
        if let Some(url) = &avatar_url {
            remove_avatar(&media_root, url).await;
        }
        return Err(e);
    }
    if let (Some(_), Some(previous)) = (&avatar_url, &user.avatar) {
        remove_avatar(&media_root, previous).await;
    }

    Ok(Redirect::to(&format!("/profile/view/{}", user.pk)).into_response())
}

async fn save_profile(
    state: &WebsiteState,
    user: &User,
    form: &ProfileForm,
    avatar_url: Option<&str>,
) -> Result<(), AppError> {
    let mut tx = state.database().start_transaction().await?;
    user.update_profile(
        ProfileChanges {
            username: &form.username,
            bio: &form.bio,
            color: &form.color,
        },
        &mut tx,
    )
    .await?;
    if let Some(url) = avatar_url {
        user.set_avatar(url, &mut tx).await?;
    }
    AllSkills::replace(user.pk, &form.skills, &mut tx).await?;

    if !form.new_skill.is_empty() {
        if user.is_staff {
            let skill = Skill::get_or_create(&form.new_skill, &mut tx).await?;
            AllSkills::add(user.pk, skill.pk, &mut tx).await?;
        } else {
            SkillConfirmation::create(&form.new_skill, user.pk, &mut tx).await?;
            tracing::info!(user_pk = user.pk, skill = %form.new_skill, "new skill requested");
        }
    }
    tx.commit().await?;
    Ok(())
}

#[derive(Template)]
#[template(path = "profiles/profile.html")]
struct ProfileTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    profile: User,
    is_own: bool,
    skills: Vec<Skill>,
    projects: Vec<ProjectWithPositions>,
}

async fn profile_view(
    state: State<WebsiteState>,
    page: PageContext,
    Path(pk): Path<i64>,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let profile = User::get_by_pk(pk, &mut conn).await?;
    let skills = AllSkills::for_user(profile.pk, &mut conn).await?;
    let projects = Project::owned_by(profile.pk, &mut conn).await?;
    let projects = ProjectWithPositions::attach(projects, &mut conn).await?;

    template_to_response(&ProfileTemplate {
        meta: Meta::with_title(profile.username.clone()),
        is_own: page.user_pk() == Some(profile.pk),
        page: page.with_tab(TAB_PROFILE),
        profile,
        skills,
        projects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_must_be_a_hex_triplet() {
        assert!(validate_color("#4A90E2").is_ok());
        assert!(validate_color("#abcdef").is_ok());
        assert!(validate_color("4A90E2").is_err());
        assert!(validate_color("#4A90E").is_err());
        assert!(validate_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_profile_form_collects_checked_skills() {
        let data: FormData = serde_urlencoded::from_str(
            "username=+ada+&bio=&color=%23000000&skills=1&skills=x&skills=4&new_skill=Rust+Developer",
        )
        .unwrap();
        let form = ProfileForm::from_form(&data);

        assert_eq!(form.username, "ada");
        assert_eq!(form.skills, vec![1, 4]);
        assert_eq!(form.new_skill, "Rust Developer");
        assert!(form.validate().is_ok());
    }
}
