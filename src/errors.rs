use askama::Template;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::website::{Meta, PageContext};

#[macro_export]
macro_rules! log_and_wrap_custom_internal {
    ($e:expr) => {{
        let error = $e;
        tracing::error!(file = file!(), line = line!(), error = %error, "unexpected internal error");
        $crate::errors::AppError::custom_internal(&error.to_string())
    }};
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("the requested resource does not exist")]
    DoesNotExist,
    #[error("you do not own this resource")]
    NotOwner,
    #[error("you are not an admin or staff user")]
    NotStaff,
    #[error("the csrf token is missing or invalid")]
    CsrfMismatch,
    #[error("the request has no session attached")]
    MissingSession,
    #[error("wrong password")]
    WrongPassword(argon2::password_hash::Error),
    #[error("error hashing the password")]
    ErrorHashingPassword(argon2::password_hash::Error),
    #[error("error rendering the template: {0}")]
    TemplateError(#[from] askama::Error),
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("error sending the email: {0}")]
    Mail(String),
    #[error("the uploaded image can not be processed: {0}")]
    Image(#[from] image::ImageError),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("{0}")]
    CustomBadRequest(String),
    #[error("{0}")]
    CustomInternal(String),
}

impl AppError {
    pub fn custom_internal(message: &str) -> Self {
        Self::CustomInternal(message.to_owned())
    }

    pub fn custom_bad_request(message: &str) -> Self {
        Self::CustomBadRequest(message.to_owned())
    }

    pub fn get_status_code_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::DoesNotExist | Self::NotOwner | Self::NotStaff => (
                StatusCode::NOT_FOUND,
                Self::DoesNotExist.to_string(),
            ),
            Self::CsrfMismatch
            | Self::WrongPassword(_)
            | Self::Image(_)
            | Self::Multipart(_)
            | Self::CustomBadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::MissingSession
            | Self::ErrorHashingPassword(_)
            | Self::TemplateError(_)
            | Self::Sqlx(_)
            | Self::Mail(_)
            | Self::CustomInternal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sorry no sorry, something wrong happened".to_owned(),
            ),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::DoesNotExist,
            e => {
                tracing::error!(error = %e, "database error");
                Self::Sqlx(e)
            }
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    meta: Meta<'a>,
    page: PageContext,
    status: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.get_status_code_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let title = if status == StatusCode::NOT_FOUND {
            "Not Found"
        } else if status.is_client_error() {
            "Bad Request"
        } else {
            "Server Error"
        };

        let template = ErrorTemplate {
            meta: Meta::with_title(title),
            page: PageContext::default(),
            status: status.as_u16(),
            message,
        };

        match template.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, Html(format!("<h1>{}</h1>", title))).into_response(),
        }
    }
}
