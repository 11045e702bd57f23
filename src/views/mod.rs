mod administrative;
mod applications;
mod misc;
mod notifications;
mod profiles;
mod projects;
mod search;

use axum::{middleware::from_fn_with_state, Router};

use crate::{auth, state::WebsiteState};

pub use search::results_message;

/// Every page of the site behind the session layer.
pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .merge(auth::routes(state.clone()))
        .merge(misc::routes(state.clone()))
        .merge(profiles::routes(state.clone()))
        .merge(projects::routes(state.clone()))
        .merge(applications::routes(state.clone()))
        .merge(search::routes(state.clone()))
        .merge(administrative::routes(state.clone()))
        .merge(notifications::routes(state.clone()))
        .layer(from_fn_with_state(state.clone(), auth::sessions_middleware))
        .with_state(state)
}
