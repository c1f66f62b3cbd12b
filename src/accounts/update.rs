use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    db::RoomUser,
    include_res, res,
    rooms::access::{self, AccessError, RoomAccess},
    session, AppResult, AppState,
};

pub const ROOM_NAME_MAX: usize = 30;

/// What the account page shows depends on which side of the room the user
/// is on. Members see the room name readonly; owners may rename.
#[derive(Debug)]
pub enum AccountView {
    Owner { room_name: String },
    Member { room_name: String },
}

pub async fn account_view(
    pool: &SqlitePool,
    user: &RoomUser,
) -> Result<AccountView, AccessError> {
    match access::resolve_room(pool, user).await? {
        RoomAccess::Owned(room) => Ok(AccountView::Owner {
            room_name: room.name,
        }),
        RoomAccess::Member(room) => Ok(AccountView::Member {
            room_name: room.name,
        }),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Saved,
    Invalid(String),
}

/// Persist new account details. A username collision is a form error, the
/// same way signup treats it; the room rename only applies to owners and
/// silently skips out-of-bounds names.
pub async fn update_account_details(
    pool: &SqlitePool,
    user: &RoomUser,
    username: &str,
    email: &str,
    roomname: &str,
) -> AppResult<UpdateOutcome> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() || !crate::is_valid_email(email) {
        return Ok(UpdateOutcome::Invalid(
            "Enter a valid username and email address.".to_string(),
        ));
    }

    let updated = sqlx::query("UPDATE users SET username = ?, email = ? WHERE id = ?")
        .bind(username)
        .bind(email)
        .bind(user.id)
        .execute(pool)
        .await;
    match updated {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok(UpdateOutcome::Invalid(
                "A user with that username already exists.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    if let RoomAccess::Owned(room) = access::resolve_room(pool, user).await? {
        let roomname = roomname.trim();
        if !roomname.is_empty() && roomname.chars().count() <= ROOM_NAME_MAX {
            sqlx::query("UPDATE rooms SET name = ? WHERE id = ?")
                .bind(roomname)
                .bind(room.id)
                .execute(pool)
                .await?;
        }
    }

    Ok(UpdateOutcome::Saved)
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateForm {
    username: String,
    email: String,
    #[serde(default)]
    roomname: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn my_account(
    session: Session,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/settings/account").into_response());
    };
    let view = account_view(&db_pool, &user).await?;
    Ok(Html(render_page(&user.username, &user.email, &view, "")).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_account(
    session: Session,
    State(db_pool): State<SqlitePool>,
    Form(form): Form<UpdateForm>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/settings/account").into_response());
    };

    match update_account_details(&db_pool, &user, &form.username, &form.email, &form.roomname)
        .await?
    {
        UpdateOutcome::Saved => Ok(Redirect::to("/settings/account").into_response()),
        UpdateOutcome::Invalid(message) => {
            let view = account_view(&db_pool, &user).await?;
            Ok(Html(render_page(&form.username, &form.email, &view, &message)).into_response())
        }
    }
}

fn render_page(username: &str, email: &str, view: &AccountView, error: &str) -> String {
    let (room_name, room_attrs) = match view {
        AccountView::Owner { room_name } => (room_name.as_str(), ""),
        AccountView::Member { room_name } => (room_name.as_str(), " readonly"),
    };
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"errors\"><li>{}</li></ul>", res::escape(error))
    };
    include_res!(str, "/pages/my_account.html")
        .replace("{errors}", &error_html)
        .replace("{username}", &res::escape(username))
        .replace("{email}", &res::escape(email))
        .replace("{room_name}", &res::escape(room_name))
        .replace("{room_attrs}", room_attrs)
}
