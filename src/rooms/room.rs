use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{include_res, res, session, AppResult, AppState};

use super::access;

#[derive(Debug, sqlx::FromRow)]
struct TopicRow {
    id: i64,
    title: String,
    created_at: i64,
    author: String,
    is_read: bool,
}

#[debug_handler(state = AppState)]
pub(crate) async fn room(
    session: Session,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/rooms").into_response());
    };
    let room_access = access::resolve_room(&db_pool, &user).await?;
    let room = room_access.room();

    let topics: Vec<TopicRow> = sqlx::query_as(
        "SELECT t.id, t.title, t.created_at, u.username AS author, \
                r.user_id IS NOT NULL AS is_read \
         FROM topics t \
         JOIN users u ON u.id = t.created_by \
         LEFT JOIN topic_reads r ON r.topic_id = t.id AND r.user_id = ? \
         WHERE t.room_id = ? \
         ORDER BY t.created_at DESC, t.id DESC",
    )
    .bind(user.id)
    .bind(room.id)
    .fetch_all(&db_pool)
    .await?;

    let mut rows = String::new();
    for t in &topics {
        rows += &include_res!(str, "/pages/room_topic_row.html")
            .replace("{topic_id}", &t.id.to_string())
            .replace("{title}", &res::escape(&t.title))
            .replace("{author}", &res::escape(&t.author))
            .replace("{created_at}", &res::format_ts(t.created_at))
            .replace("{row_class}", if t.is_read { "topic" } else { "topic unread" });
    }

    let invite_link = if room_access.is_owner() {
        format!(
            "<a href=\"/rooms/{}/invite\">Invite a member</a>",
            room.id
        )
    } else {
        String::new()
    };

    Ok(Html(
        include_res!(str, "/pages/room.html")
            .replace("{room_name}", &res::escape(&room.name))
            .replace("{room_id}", &room.id.to_string())
            .replace("{rows}", &rows)
            .replace("{invite_link}", &invite_link),
    )
    .into_response())
}
