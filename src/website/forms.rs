use std::collections::HashMap;

use axum::extract::{FromRef, FromRequest, Request};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize};
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{errors::AppError, sessions::Session, state::WebsiteState};

pub const NON_FIELD_ERRORS: &str = "__all__";

/// Url-encoded form whose `csrf_token` field must match the session token.
#[derive(Debug)]
pub struct SecureForm<T>(pub T);

#[derive(Deserialize)]
struct CsrfField {
    #[serde(default)]
    csrf_token: String,
}

impl<S, T> FromRequest<S> for SecureForm<T>
where
    T: DeserializeOwned,
    WebsiteState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let state = WebsiteState::from_ref(state);
        let session = req
            .extensions()
            .get::<Session>()
            .cloned()
            .ok_or(AppError::MissingSession)?;

        let body = Bytes::from_request(req, &())
            .await
            .map_err(|e| AppError::custom_bad_request(&e.body_text()))?;

        let csrf: CsrfField =
            serde_urlencoded::from_bytes(&body).map_err(|_| AppError::CsrfMismatch)?;
        check_csrf(&session, &state, &csrf.csrf_token).await?;

        serde_urlencoded::from_bytes(&body)
            .map(Self)
            .map_err(|e| AppError::custom_bad_request(&e.to_string()))
    }
}

pub async fn check_csrf(session: &Session, state: &WebsiteState, token: &str) -> Result<(), AppError> {
    if session.token_is_valid(&state.config().session_key, token).await {
        Ok(())
    } else {
        tracing::warn!("csrf token mismatch");
        Err(AppError::CsrfMismatch)
    }
}

/// Raw key/value pairs of a form, keeps repeated keys and their order.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_owned()
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn push(&mut self, key: String, value: String) {
        self.0.push((key, value));
    }
}

/// Error messages per field, rendered next to the inputs.
#[derive(Debug, Default, Clone)]
pub struct FormErrors(HashMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message)
    }

    pub fn get(&self, field: &str) -> Vec<String> {
        self.0.get(field).cloned().unwrap_or_default()
    }

    pub fn non_field(&self) -> Vec<String> {
        self.get(NON_FIELD_ERRORS)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = Self::default();
        for (field, kind) in errors.into_errors() {
            let field = if field == "__all__" { NON_FIELD_ERRORS } else { &field };
            if let ValidationErrorsKind::Field(errors) = kind {
                for error in errors {
                    let message = error
                        .message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_message(&error.code));
                    form_errors.add(field, message);
                }
            }
        }
        form_errors
    }
}

fn default_message(code: &str) -> String {
    match code {
        "email" => "Enter a valid email address.".into(),
        "length" => "Ensure this value has a valid length.".into(),
        "must_match" => "The two password fields didn't match.".into(),
        "required" => "This field is required.".into(),
        _ => "Enter a valid value.".into(),
    }
}
