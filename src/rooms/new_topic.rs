use axum::{
    debug_handler,
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use std::path::Path as FsPath;
use uuid::Uuid;

use crate::{config::AppConfig, include_res, now_ts, res, session, AppResult, AppState};

use super::access;

pub const TITLE_MAX: usize = 160;
pub const MESSAGE_MAX: usize = 1000;

#[derive(Debug)]
pub struct NewFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Insert a topic with its attachments. Attachment payloads land under
/// `upload_dir` keyed by a generated blob name; the original file name is
/// kept only as display metadata.
pub async fn create_topic(
    pool: &SqlitePool,
    upload_dir: &FsPath,
    room_id: i64,
    user_id: i64,
    title: &str,
    message: &str,
    files: Vec<NewFile>,
) -> AppResult<i64> {
    let topic_id = sqlx::query(
        "INSERT INTO topics (title, message, created_at, created_by, room_id) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(message)
    .bind(now_ts())
    .bind(user_id)
    .bind(room_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    if !files.is_empty() {
        tokio::fs::create_dir_all(upload_dir).await?;
    }
    for file in files {
        let blob_name = Uuid::now_v7().simple().to_string();
        tokio::fs::write(upload_dir.join(&blob_name), &file.data).await?;
        sqlx::query("INSERT INTO files (file_name, blob_name, topic_id) VALUES (?, ?, ?)")
            .bind(&file.file_name)
            .bind(&blob_name)
            .bind(topic_id)
            .execute(pool)
            .await?;
    }

    Ok(topic_id)
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_topic_page(
    session: tower_sessions::Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{pk}/new")).into_response());
    };
    access::resolve_room_checked(&db_pool, &user, pk).await?;
    Ok(Html(render_form(pk, "")).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_topic(
    session: tower_sessions::Session,
    Path(pk): Path<i64>,
    State(db_pool): State<SqlitePool>,
    State(config): State<AppConfig>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{pk}/new")).into_response());
    };
    access::resolve_room_checked(&db_pool, &user, pk).await?;

    let mut title = String::new();
    let mut message = String::new();
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => title = field.text().await?,
            Some("message") => message = field.text().await?,
            Some("files") => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await?.to_vec();
                // Browsers submit an empty part when no file was picked.
                if !file_name.is_empty() && !data.is_empty() {
                    files.push(NewFile { file_name, data });
                }
            }
            _ => {}
        }
    }

    let title = title.trim().to_string();
    if title.is_empty() || title.chars().count() > TITLE_MAX {
        return Ok(Html(render_form(
            pk,
            &format!("Title is required and must be at most {TITLE_MAX} characters."),
        ))
        .into_response());
    }
    if message.chars().count() > MESSAGE_MAX {
        return Ok(Html(render_form(
            pk,
            &format!("Message must be at most {MESSAGE_MAX} characters."),
        ))
        .into_response());
    }

    create_topic(
        &db_pool,
        &config.upload_dir,
        pk,
        user.id,
        &title,
        &message,
        files,
    )
    .await?;

    Ok(Redirect::to("/rooms").into_response())
}

fn render_form(room_id: i64, error: &str) -> String {
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"errors\"><li>{}</li></ul>", res::escape(error))
    };
    include_res!(str, "/pages/new_topic.html")
        .replace("{room_id}", &room_id.to_string())
        .replace("{errors}", &error_html)
}
