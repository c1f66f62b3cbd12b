use axum::{
    debug_handler,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    config::AppConfig,
    db::TopicFile,
    include_res, res, session, AppError, AppResult, AppState,
};

use super::access;

#[debug_handler(state = AppState)]
pub(crate) async fn topic(
    session: Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/topic/{pk}")).into_response());
    };
    let (topic, _access) = access::topic_for_user(&db_pool, &user, pk).await?;
    access::mark_read(&db_pool, topic.id, user.id).await?;

    let author: (String,) = sqlx::query_as("SELECT username FROM users WHERE id = ?")
        .bind(topic.created_by)
        .fetch_one(&db_pool)
        .await?;

    let files: Vec<TopicFile> = sqlx::query_as(
        "SELECT id, file_name, blob_name, topic_id FROM files WHERE topic_id = ? ORDER BY id",
    )
    .bind(topic.id)
    .fetch_all(&db_pool)
    .await?;

    let mut file_rows = String::new();
    for f in &files {
        file_rows += &include_res!(str, "/pages/topic_file_row.html")
            .replace("{file_id}", &f.id.to_string())
            .replace("{file_name}", &res::escape(&f.file_name));
    }

    Ok(Html(
        include_res!(str, "/pages/topic.html")
            .replace("{topic_id}", &topic.id.to_string())
            .replace("{title}", &res::escape(&topic.title))
            .replace("{message}", &res::escape(&topic.message))
            .replace("{author}", &res::escape(&author.0))
            .replace("{created_at}", &res::format_ts(topic.created_at))
            .replace("{files}", &file_rows),
    )
    .into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn file(
    session: Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
    State(config): State<AppConfig>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/files/{pk}")).into_response());
    };

    let file: TopicFile = sqlx::query_as(
        "SELECT id, file_name, blob_name, topic_id FROM files WHERE id = ?",
    )
    .bind(pk)
    .fetch_optional(&db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    // Authorization rides on the owning topic.
    access::topic_for_user(&db_pool, &user, file.topic_id).await?;

    let bytes = tokio::fs::read(config.upload_dir.join(&file.blob_name)).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.file_name.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
