use axum::response::Redirect;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, db::RoomUser, AppResult};

pub const USER_ID: &str = "user_id";

/// The authenticated user for this request, if any. A user that has been
/// deactivated (or never confirmed their email) is never authenticated,
/// even if a stale session cookie still carries their id.
pub async fn current_user(session: &Session, pool: &SqlitePool) -> AppResult<Option<RoomUser>> {
    let Some(user_id) = session.get::<i64>(USER_ID).await? else {
        return Ok(None);
    };
    Ok(db::get_user(pool, user_id).await?.filter(|u| u.is_active))
}

pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!("/login?next={next}"))
}
