//! The account activation state machine: PENDING (`is_active = 0`) moves to
//! ACTIVE exactly once, via a signed single-use-effect token delivered by
//! email. Confirm collapses every failure (bad reference, unknown user, bad
//! token) into one `Rejected` outcome so the page gives no enumeration
//! signal; resend fails hard with 404 instead, since it is reached by a
//! direct link rather than a user-typed form.

use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{config::AppConfig, db, db::RoomUser, email::Mailer, include_res, now_ts, res,
    AppError, AppResult, AppState};

use super::tokens;

pub const CONFIRMATION_SUBJECT: &str = "[TeamGlade] Confirm your email address";

#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Rejected,
}

/// Send a confirmation email and return the encoded identity reference the
/// caller redirects with. Safe to call any number of times: each call mints
/// a fresh token without invalidating earlier ones.
pub async fn issue_confirmation(
    mailer: &dyn Mailer,
    config: &AppConfig,
    user: &RoomUser,
) -> AppResult<String> {
    let uidb64 = tokens::encode_uid(user.id);
    let token = tokens::make_token(&config.secret_key, user, now_ts());
    let link = format!(
        "{}/signup/email-confirmed/{}/{}",
        config.base_url, uidb64, token
    );
    let body = format!(
        "Hello {},\n\n\
         Please confirm your email address by following the link below:\n\n\
         {}\n\n\
         If you did not create a TeamGlade account, you can ignore this message.\n",
        user.username, link
    );
    mailer.send(&user.email, CONFIRMATION_SUBJECT, &body).await?;
    Ok(uidb64)
}

pub async fn confirm_email(
    pool: &SqlitePool,
    config: &AppConfig,
    uidb64: &str,
    token: &str,
) -> AppResult<ConfirmOutcome> {
    let Some(user_id) = tokens::decode_uid(uidb64) else {
        return Ok(ConfirmOutcome::Rejected);
    };
    let Some(user) = db::get_user(pool, user_id).await? else {
        return Ok(ConfirmOutcome::Rejected);
    };
    if !tokens::check_token(&config.secret_key, &user, token) {
        return Ok(ConfirmOutcome::Rejected);
    }

    sqlx::query("UPDATE users SET is_active = 1 WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(ConfirmOutcome::Confirmed)
}

/// Re-issue the confirmation email for an encoded identity reference.
/// Unknown or malformed references are a hard not-found.
pub async fn resend_email(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    config: &AppConfig,
    uidb64: &str,
) -> AppResult<String> {
    let user_id = tokens::decode_uid(uidb64).ok_or(AppError::NotFound)?;
    let user = db::get_user(pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    issue_confirmation(mailer, config, &user).await
}

#[debug_handler]
pub(crate) async fn email_confirmation(Path(uidb64): Path<String>) -> impl IntoResponse {
    Html(confirmation_sent_page(&uidb64))
}

#[debug_handler(state = AppState)]
pub(crate) async fn email_confirmed(
    Path((uidb64, token)): Path<(String, String)>,
    State(db_pool): State<SqlitePool>,
    State(config): State<AppConfig>,
) -> AppResult<Response> {
    match confirm_email(&db_pool, &config, &uidb64, &token).await? {
        ConfirmOutcome::Confirmed => Ok(Html(include_res!(str, "/pages/email_confirmed.html"))
            .into_response()),
        ConfirmOutcome::Rejected => Ok(Html(not_confirmed_page(&uidb64)).into_response()),
    }
}

// The path segment is attacker-controlled and percent-decoded; escape it
// before it lands in the page. A real reference is URL-safe base64, which
// escaping never alters.
fn confirmation_sent_page(uidb64: &str) -> String {
    include_res!(str, "/pages/email_confirmation_sent.html")
        .replace("{uidb64}", &res::escape(uidb64))
}

fn not_confirmed_page(uidb64: &str) -> String {
    include_res!(str, "/pages/email_not_confirmed.html")
        .replace("{uidb64}", &res::escape(uidb64))
}

#[debug_handler(state = AppState)]
pub(crate) async fn email_resend(
    Path(uidb64): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(mailer): State<Arc<dyn Mailer>>,
    State(config): State<AppConfig>,
) -> AppResult<Redirect> {
    let uidb64 = resend_email(&db_pool, mailer.as_ref(), &config, &uidb64).await?;
    Ok(Redirect::to(&format!(
        "/signup/email-confirmation/{uidb64}"
    )))
}
