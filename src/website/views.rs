use askama::Template;
use axum::response::Html;

use crate::errors::AppError;

pub type HtmlResult = Result<Html<String>, AppError>;

pub fn template_to_response<T: Template>(tmpl: &T) -> HtmlResult {
    tmpl.render().map(Html).map_err(AppError::TemplateError)
}

/// Only local paths are accepted as redirect targets.
pub fn safe_next<'a>(next: Option<&'a str>, default: &'a str) -> &'a str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => default,
    }
}
