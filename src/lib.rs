pub mod accounts;
pub mod botcheck;
pub mod config;
pub mod db;
pub mod email;
pub mod index;
pub mod res;
pub mod rooms;
pub mod session;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{Html, IntoResponse, Response}};
use sqlx::SqlitePool;

use crate::{config::AppConfig, email::Mailer};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub config: AppConfig,
}

pub type AppResult<T> = Result<T, AppError>;

/// Boundary error for handlers. Authorization failures and genuinely
/// missing resources share the `NotFound` shape: the response never reveals
/// whether a resource exists behind a permission wall.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(crate::include_res!(str, "/pages/not_found.html")),
            )
                .into_response(),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "unhandled error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Internal(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(anyhow::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(axum::extract::multipart::MultipartError);
apperr_impl!(std::io::Error);
apperr_impl!(email::EmailError);
apperr_impl!(argon2::password_hash::Error);

impl From<rooms::access::AccessError> for AppError {
    fn from(err: rooms::access::AccessError) -> Self {
        match err {
            rooms::access::AccessError::Denied => Self::NotFound,
            rooms::access::AccessError::Db(e) => Self::Internal(anyhow::Error::from(e)),
        }
    }
}

pub fn now_ts() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Minimal syntactic email check, enough to bounce obvious garbage before
/// it reaches the mail transport.
pub fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}
