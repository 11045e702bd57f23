use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    errors::AppError,
    models::{Notification, User},
    sessions::Session,
    state::WebsiteState,
};

pub const TAB_HOME: &str = "Home";
pub const TAB_PROFILE: &str = "Profile";
pub const TAB_PROJECTS: &str = "Projects";
pub const TAB_APPLICATIONS: &str = "Applications";
pub const TAB_SEARCH: &str = "Search";
pub const TAB_ADMINISTRATIVE: &str = "Administrative";
pub const TAB_NOTIFICATIONS: &str = "Notifications";
pub const TAB_ACCOUNT: &str = "Account";

#[derive(Debug, Clone)]
pub struct NavUser {
    pub pk: i64,
    pub username: String,
    pub is_staff: bool,
}

/// Navigation state shared by every page: who is browsing, the csrf token for
/// the forms and the unread notification counter.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub current_tab: &'static str,
    pub csrf_token: String,
    pub user: Option<NavUser>,
    pub unread_count: i64,
}

impl Default for PageContext {
    fn default() -> Self {
        Self {
            current_tab: TAB_HOME,
            csrf_token: String::new(),
            user: None,
            unread_count: 0,
        }
    }
}

impl PageContext {
    pub fn with_tab(mut self, tab: &'static str) -> Self {
        self.current_tab = tab;
        self
    }

    pub fn user_pk(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.pk)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    WebsiteState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = WebsiteState::from_ref(state);
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::MissingSession)?;

        let csrf_token = session.csrf_token(&state.config().session_key).await;

        let mut page = Self {
            csrf_token,
            ..Default::default()
        };

        if let Some(user_pk) = session.user_pk().await {
            let mut conn = state.database().acquire().await?;
            if let Some(user) = User::find_by_pk(user_pk, &mut conn).await? {
                page.unread_count = Notification::count_unread(user.pk, &mut conn).await?;
                page.user = Some(NavUser {
                    pk: user.pk,
                    username: user.username,
                    is_staff: user.is_staff,
                });
            }
        }

        Ok(page)
    }
}
