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
    models::{Notification, NotificationFilter, User},
    state::WebsiteState,
    website::{
        template_to_response, FormData, HtmlResult, Meta, PageContext, SecureForm,
        TAB_NOTIFICATIONS,
    },
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/notifications/all", get(notifications))
        .route("/notifications/unread", get(unread))
        .route("/notifications/read", get(read))
        .route("/notifications/deletion_view", get(deletion_view))
        .route("/notifications/mark_read/{pk}", post(mark_read))
        .route("/notifications/mark_unread/{pk}", post(mark_unread))
        .route("/notifications/deletion/{pk}", post(delete))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware))
        .with_state(state)
}

#[derive(Clone, Copy, PartialEq)]
enum HubView {
    All,
    Unread,
    Read,
    Deletion,
}

impl HubView {
    fn filter(&self) -> NotificationFilter {
        match self {
            Self::All => NotificationFilter::All,
            Self::Unread => NotificationFilter::Unread,
            Self::Read | Self::Deletion => NotificationFilter::Read,
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Self::All => "All notifications",
            Self::Unread => "Unread notifications",
            Self::Read => "Read notifications",
            Self::Deletion => "Delete notifications",
        }
    }
}

#[derive(Template)]
#[template(path = "notifications/notifications.html")]
struct NotificationsTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    heading: &'static str,
    deletion: bool,
    notifications: Vec<Notification>,
}

async fn render_hub(
    state: &WebsiteState,
    page: PageContext,
    user: &User,
    view: HubView,
) -> HtmlResult {
    let mut conn = state.database().acquire().await?;
    let notifications = Notification::list(user.pk, view.filter(), &mut conn).await?;

    template_to_response(&NotificationsTemplate {
        meta: Meta::with_title(view.heading()),
        page: page.with_tab(TAB_NOTIFICATIONS),
        heading: view.heading(),
        deletion: view == HubView::Deletion,
        notifications,
    })
}

async fn notifications(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    render_hub(&state, page, &user, HubView::All).await
}

async fn unread(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    render_hub(&state, page, &user, HubView::Unread).await
}

async fn read(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    render_hub(&state, page, &user, HubView::Read).await
}

async fn deletion_view(
    state: State<WebsiteState>,
    page: PageContext,
    Extension(user): Extension<User>,
) -> HtmlResult {
    render_hub(&state, page, &user, HubView::Deletion).await
}

async fn mark_read(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut conn = state.database().acquire().await?;
    Notification::mark_read(pk, user.pk, &mut conn).await?;
    Ok(Redirect::to("/notifications/unread"))
}

async fn mark_unread(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut conn = state.database().acquire().await?;
    Notification::mark_unread(pk, user.pk, &mut conn).await?;
    Ok(Redirect::to("/notifications/read"))
}

async fn delete(
    state: State<WebsiteState>,
    Extension(user): Extension<User>,
    Path(pk): Path<i64>,
    SecureForm(_): SecureForm<FormData>,
) -> Result<Redirect, AppError> {
    let mut conn = state.database().acquire().await?;
    Notification::delete(pk, user.pk, &mut conn).await?;
    Ok(Redirect::to("/notifications/deletion_view"))
}
