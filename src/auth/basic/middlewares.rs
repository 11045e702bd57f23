use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use axum_extra::{headers::Cookie, TypedHeader};

use super::services::set_session_cookies;
use crate::{
    database::Database, errors::AppError, models::User, sessions::Session, state::WebsiteState,
};

pub async fn sessions_middleware(
    state: State<WebsiteState>,
    cookie: Option<TypedHeader<Cookie>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let sessions = state.sessions();
    let config = state.config();

    let current_session = match cookie
        .as_ref()
        .and_then(|TypedHeader(cookie)| cookie.get(&config.session_cookie_name))
    {
        Some(session_id) => sessions.find_session(session_id).await?,
        None => None,
    };

    let session = match current_session {
        Some(session) => session,
        None => sessions.create_session(config.session_expiration).await?,
    };

    request.extensions_mut().insert(session.clone());

    let mut resp = next.run(request).await;

    set_session_cookies(resp.headers_mut(), &session, config).await?;

    Ok(resp)
}

/// Loads the active user bound to the session or sends the visitor to the login page.
pub async fn login_required_middleware(
    database: State<Database>,
    Extension(session): Extension<Session>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(user) = session_user(&database, &session).await? {
        request.extensions_mut().insert(user);
        return Ok(next.run(request).await);
    }

    let query = serde_urlencoded::to_string([("next", request.uri().to_string())])
        .map_err(|e| AppError::custom_internal(&e.to_string()))?;
    Ok(Redirect::to(&format!("/accounts/login?{}", query)).into_response())
}

/// Must run after `login_required_middleware`. Non staff users get a not found.
pub async fn staff_required_middleware(
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_staff {
        tracing::warn!(user_pk = user.pk, "non staff user tried to reach an administrative page");
        return Err(AppError::NotStaff);
    }
    Ok(next.run(request).await)
}

async fn session_user(database: &Database, session: &Session) -> Result<Option<User>, AppError> {
    let Some(user_pk) = session.user_pk().await else {
        return Ok(None);
    };
    let mut conn = database.acquire().await?;
    Ok(User::find_by_pk(user_pk, &mut conn)
        .await?
        .filter(|user| user.is_active))
}
