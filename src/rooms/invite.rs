//! Room invitations. An invite mints a shadow account whose username and
//! email are both the invited address and whose password is the invite
//! code, so the emailed link doubles as a credential. Invited accounts are
//! active immediately; the email round trip already proves the address.

use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use rand::Rng;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;

use crate::{
    accounts::passwords,
    config::AppConfig,
    db::{RoomUser, USER_COLUMNS},
    email::Mailer,
    include_res, is_valid_email, now_ts, res, session, AppError, AppResult, AppState,
};

use super::access::{self, AccessError, RoomAccess};

pub const INVITE_SUBJECT: &str = "[TeamGlade] You are invited to join TeamGlade room";
pub const INVITE_CODE_LEN: usize = 8;

const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug)]
pub enum InviteOutcome {
    Sent,
    Invalid(String),
}

/// Create the invited member account and email the join link. Only the
/// room's owner may invite, and only into the room named in the URL.
pub async fn send_invite(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    config: &AppConfig,
    owner: &RoomUser,
    room_id: i64,
    email: &str,
) -> AppResult<InviteOutcome> {
    let room_access = access::resolve_room_checked(pool, owner, room_id).await?;
    let RoomAccess::Owned(room) = room_access else {
        return Err(AppError::NotFound);
    };

    let email = email.trim();
    if !is_valid_email(email) {
        return Ok(InviteOutcome::Invalid(
            "Enter a valid email address.".to_string(),
        ));
    }

    let code = generate_invite_code();
    let password_hash = passwords::hash_password(&code)?;
    let inserted = sqlx::query(
        "INSERT INTO users \
         (username, email, password_hash, is_active, invite_code, member_of, created_at) \
         VALUES (?, ?, ?, 1, ?, ?, ?)",
    )
    .bind(email)
    .bind(email)
    .bind(&password_hash)
    .bind(&code)
    .bind(room.id)
    .bind(now_ts())
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok(InviteOutcome::Invalid(
                "A user with this email already exists.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let link = format!("{}/rooms/invite/{}", config.base_url, code);
    let body = format!(
        "Hello,\n\n\
         {} invited you to join the \"{}\" room on TeamGlade.\n\n\
         Follow the link below to enter the room:\n\n\
         {}\n",
        owner.username, room.name, link
    );
    mailer.send(email, INVITE_SUBJECT, &body).await?;

    Ok(InviteOutcome::Sent)
}

/// Look up the active member account behind an invite code.
pub async fn login_via_code(pool: &SqlitePool, code: &str) -> Result<RoomUser, AccessError> {
    let query = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE invite_code = ? AND is_active = 1"
    );
    let user: Option<RoomUser> = sqlx::query_as(&query)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    user.ok_or(AccessError::Denied)
}

#[derive(Debug, Deserialize)]
pub(crate) struct InviteForm {
    email: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn invite_page(
    session: Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{pk}/invite")).into_response());
    };
    let room_access = access::resolve_room_checked(&db_pool, &user, pk).await?;
    if !room_access.is_owner() {
        return Err(AppError::NotFound);
    }

    Ok(Html(render_form(pk, "")).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn invite(
    session: Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
    State(mailer): State<Arc<dyn Mailer>>,
    State(config): State<AppConfig>,
    Form(form): Form<InviteForm>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{pk}/invite")).into_response());
    };

    match send_invite(&db_pool, mailer.as_ref(), &config, &user, pk, &form.email).await? {
        InviteOutcome::Sent => Ok(Redirect::to("/rooms").into_response()),
        InviteOutcome::Invalid(message) => {
            Ok(Html(render_form(pk, &message)).into_response())
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn login_invited(
    session: Session,
    Path(code): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Redirect> {
    let user = login_via_code(&db_pool, &code).await?;
    session.insert(session::USER_ID, user.id).await?;
    tracing::info!(user_id = user.id, "invited member login");
    Ok(Redirect::to("/rooms"))
}

fn render_form(room_id: i64, error: &str) -> String {
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"errors\"><li>{}</li></ul>", res::escape(error))
    };
    include_res!(str, "/pages/invite.html")
        .replace("{room_id}", &room_id.to_string())
        .replace("{errors}", &error_html)
}
