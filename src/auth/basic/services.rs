use std::borrow::Cow;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use cookie::{time::Duration, SameSite};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    config::Config,
    errors::AppError,
    log_and_wrap_custom_internal,
    models::{User, UserWithPassword},
    sessions::Session,
    state::WebsiteState,
    website::{safe_next, FormErrors},
};

use super::infrastructure::AuthenticationToken;

/// Outer error aborts the request, inner error re-renders the form.
pub type FormResult<T> = Result<Result<T, FormErrors>, AppError>;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignUpForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "The username must have between 1 and 100 characters."
    ))]
    pub username: String,
    #[validate(length(min = 8, message = "The password must have at least 8 characters."))]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    pub password2: String,
    #[validate(custom(function = "validate_honey_pot"))]
    pub honey_pot: String,
}

fn validate_honey_pot(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new("honey_pot").with_message(Cow::Borrowed("Take that bot!")))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password is required."))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

pub async fn handle_signup<'a>(
    state: &'a WebsiteState,
    session: &Session,
    input: &SignUpForm,
) -> FormResult<&'a str> {
    if let Err(errors) = input.validate() {
        return Ok(Err(errors.into()));
    }

    let config = state.config();
    let password = hash_password(&input.password1)?;
    let mut tx = state.database().start_transaction().await?;

    if User::email_exists(&input.email, &mut tx).await? {
        let mut errors = FormErrors::default();
        errors.add("email", "A user with that email already exists.");
        return Ok(Err(errors));
    }

    let user = User::create(
        &input.email,
        input.username.trim(),
        &password,
        !config.email_validation,
        false,
        &mut tx,
    )
    .await?;

    if config.email_validation {
        let token = AuthenticationToken::new(user.pk, config.token_expiration_hours)
            .save(&mut tx)
            .await?;
        token.send(config, state.mailer(), &user.email).await?;
        tx.commit().await?;
        tracing::info!(user_pk = user.pk, "user signed up, waiting for email confirmation");
        Ok(Ok(config.email_validation_redirect.as_str()))
    } else {
        tx.commit().await?;
        state.sessions().login(session, user.pk).await?;
        tracing::info!(user_pk = user.pk, "user signed up");
        Ok(Ok(config.login_redirect_to.as_str()))
    }
}

pub async fn handle_login<'a>(
    state: &'a WebsiteState,
    session: &Session,
    params: &'a NextParams,
    input: &LoginForm,
) -> FormResult<&'a str> {
    if let Err(errors) = input.validate() {
        return Ok(Err(errors.into()));
    }

    let user = match validate_login(state, input).await? {
        Ok(user) => user,
        Err(message) => {
            let mut errors = FormErrors::default();
            errors.add_non_field(message);
            return Ok(Err(errors));
        }
    };

    state.sessions().login(session, user.user.pk).await?;
    tracing::info!(user_pk = user.user.pk, "user logged in");

    let config = state.config();
    Ok(Ok(safe_next(
        params.next.as_deref(),
        &config.login_redirect_to,
    )))
}

async fn validate_login(
    state: &WebsiteState,
    input: &LoginForm,
) -> Result<Result<UserWithPassword, &'static str>, AppError> {
    let mut conn = state.database().acquire().await?;
    let user = match User::find_by_email_with_password(&input.email, &mut conn).await? {
        Some(user) => user,
        None => return Ok(Err("Please enter a correct email and password.")),
    };

    match verify_password(&input.password, &user.password) {
        Ok(()) => {}
        Err(AppError::WrongPassword(_)) => {
            return Ok(Err("Please enter a correct email and password."))
        }
        Err(e) => return Err(e),
    }

    if !user.user.is_active {
        return Ok(Err(
            "This account is not active yet, please confirm your email address.",
        ));
    }
    Ok(Ok(user))
}

/// Activates the owner of the token and logs them in.
pub async fn handle_token_confirmation<'a>(
    state: &'a WebsiteState,
    session: &Session,
    token: &str,
) -> Result<&'a str, AppError> {
    let mut tx = state.database().start_transaction().await?;
    let token = AuthenticationToken::find(token, &mut tx)
        .await?
        .ok_or(AppError::DoesNotExist)?;

    if token.is_expired() {
        token.delete(&mut tx).await?;
        tx.commit().await?;
        return Err(AppError::DoesNotExist);
    }

    let user = User::get_by_pk(token.user_pk, &mut tx)
        .await?
        .set_to_active(&mut tx)
        .await?;
    token.delete(&mut tx).await?;
    tx.commit().await?;

    state.sessions().login(session, user.pk).await?;
    tracing::info!(user_pk = user.pk, "email confirmed");
    Ok(state.config().login_redirect_to.as_str())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AppError::ErrorHashingPassword)?
        .to_string())
}

pub fn verify_password(raw_password: &str, db_password: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(db_password).map_err(AppError::ErrorHashingPassword)?;
    Argon2::default()
        .verify_password(raw_password.as_bytes(), &parsed_hash)
        .map_err(AppError::WrongPassword)
}

pub async fn set_session_cookies(
    headers: &mut HeaderMap<HeaderValue>,
    session: &Session,
    config: &Config,
) -> Result<(), AppError> {
    let cookie = cookie::Cookie::build((
        &config.csrf_cookie_name,
        session.csrf_token(&config.session_key).await,
    ))
    .domain(config.domain())
    .path("/")
    .max_age(Duration::days(config.session_expiration))
    .secure(config.secure_cookies())
    .http_only(false)
    .same_site(SameSite::Lax)
    .build();

    headers.append(
        SET_COOKIE,
        HeaderValue::from_bytes(cookie.encoded().to_string().as_bytes())
            .map_err(|e| log_and_wrap_custom_internal!(e))?,
    );

    let cookie = cookie::Cookie::build((&config.session_cookie_name, session.id().await))
        .domain(config.domain())
        .path("/")
        .max_age(Duration::days(config.session_expiration))
        .secure(config.secure_cookies())
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    headers.append(
        SET_COOKIE,
        HeaderValue::from_bytes(cookie.encoded().to_string().as_bytes())
            .map_err(|e| log_and_wrap_custom_internal!(e))?,
    );

    if config.secure_cookies() {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("frame-ancestors 'none'"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    Ok(())
}
