use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use std::io::ErrorKind;
use std::path::Path as FsPath;
use tower_sessions::Session;

use crate::{config::AppConfig, db::RoomUser, include_res, res, session, AppError, AppResult,
    AppState};

use super::access;

/// Remove a topic, its attachment rows and their blobs. Callers without
/// delete rights get a not-found, the same as for a foreign topic.
pub async fn delete_topic(
    pool: &SqlitePool,
    upload_dir: &FsPath,
    user: &RoomUser,
    topic_id: i64,
) -> AppResult<()> {
    let (topic, room_access) = access::topic_for_user(pool, user, topic_id).await?;
    if !access::can_delete(user, &room_access, &topic) {
        return Err(AppError::NotFound);
    }

    let blobs: Vec<(String,)> =
        sqlx::query_as("SELECT blob_name FROM files WHERE topic_id = ?")
            .bind(topic.id)
            .fetch_all(pool)
            .await?;

    // File rows go with the topic via ON DELETE CASCADE.
    sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(topic.id)
        .execute(pool)
        .await?;

    for (blob_name,) in blobs {
        match tokio::fs::remove_file(upload_dir.join(&blob_name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_page(
    session: Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/topic/{pk}/delete")).into_response());
    };
    let (topic, room_access) = access::topic_for_user(&db_pool, &user, pk).await?;
    if !access::can_delete(&user, &room_access, &topic) {
        return Err(AppError::NotFound);
    }

    Ok(Html(
        include_res!(str, "/pages/delete_topic.html")
            .replace("{topic_id}", &topic.id.to_string())
            .replace("{title}", &res::escape(&topic.title)),
    )
    .into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    session: Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
    State(config): State<AppConfig>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/topic/{pk}/delete")).into_response());
    };
    delete_topic(&db_pool, &config.upload_dir, &user, pk).await?;
    Ok(Redirect::to("/rooms").into_response())
}
