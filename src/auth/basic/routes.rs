use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};

use crate::{
    errors::AppError,
    sessions::Session,
    state::WebsiteState,
    website::{template_to_response, FormErrors, HtmlResult, Meta, PageContext, SecureForm, TAB_ACCOUNT},
};

use super::services::{
    handle_login, handle_signup, handle_token_confirmation, LoginForm, NextParams, SignUpForm,
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/accounts/signup", get(signup).post(post_signup))
        .route("/accounts/login", get(login).post(post_login))
        .route("/accounts/logout", get(logout))
        .route("/accounts/email_confirmation", get(email_confirmation))
        .route("/accounts/token_confirmation/{token}", get(token_confirmation))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "accounts/signup.html")]
struct SignUpTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    email: String,
    username: String,
    errors: FormErrors,
}

async fn signup(page: PageContext) -> HtmlResult {
    template_to_response(&SignUpTemplate {
        meta: Meta::with_title("Sign up"),
        page: page.with_tab(TAB_ACCOUNT),
        email: String::new(),
        username: String::new(),
        errors: FormErrors::default(),
    })
}

async fn post_signup(
    state: State<WebsiteState>,
    Extension(session): Extension<Session>,
    page: PageContext,
    SecureForm(input): SecureForm<SignUpForm>,
) -> Result<Response, AppError> {
    match handle_signup(&state, &session, &input).await? {
        Ok(redirect) => Ok(Redirect::to(redirect).into_response()),
        Err(errors) => template_to_response(&SignUpTemplate {
            meta: Meta::with_title("Sign up"),
            page: page.with_tab(TAB_ACCOUNT),
            email: input.email,
            username: input.username,
            errors,
        })
        .map(IntoResponse::into_response),
    }
}

#[derive(Template)]
#[template(path = "accounts/login.html")]
struct LoginTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    email: String,
    next: String,
    errors: FormErrors,
}

async fn login(page: PageContext, Query(params): Query<NextParams>) -> HtmlResult {
    template_to_response(&LoginTemplate {
        meta: Meta::with_title("Log in"),
        page: page.with_tab(TAB_ACCOUNT),
        email: String::new(),
        next: params.next.unwrap_or_default(),
        errors: FormErrors::default(),
    })
}

async fn post_login(
    state: State<WebsiteState>,
    Extension(session): Extension<Session>,
    page: PageContext,
    Query(params): Query<NextParams>,
    SecureForm(input): SecureForm<LoginForm>,
) -> Result<Response, AppError> {
    match handle_login(&state, &session, &params, &input).await? {
        Ok(redirect) => Ok(Redirect::to(redirect).into_response()),
        Err(errors) => template_to_response(&LoginTemplate {
            meta: Meta::with_title("Log in"),
            page: page.with_tab(TAB_ACCOUNT),
            email: input.email,
            next: params.next.clone().unwrap_or_default(),
            errors,
        })
        .map(IntoResponse::into_response),
    }
}

async fn logout(
    state: State<WebsiteState>,
    Extension(session): Extension<Session>,
) -> Result<Redirect, AppError> {
    state.sessions().logout(&session).await?;
    Ok(Redirect::to("/"))
}

#[derive(Template)]
#[template(path = "accounts/email_confirmation.html")]
struct EmailConfirmationTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
}

async fn email_confirmation(page: PageContext) -> HtmlResult {
    template_to_response(&EmailConfirmationTemplate {
        meta: Meta::with_title("Confirm your email"),
        page: page.with_tab(TAB_ACCOUNT),
    })
}

async fn token_confirmation(
    state: State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(token): Path<String>,
) -> Result<Redirect, AppError> {
    handle_token_confirmation(&state, &session, &token)
        .await
        .map(Redirect::to)
}
