//! Room membership resolution. Every user belongs to exactly one room,
//! either the one they created at signup or the one they were invited into.
//! Denied access surfaces as a 404 so room identifiers leak nothing.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{Room, RoomUser, Topic};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("room access denied")]
    Denied,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug)]
pub enum RoomAccess {
    Owned(Room),
    Member(Room),
}

impl RoomAccess {
    pub fn room(&self) -> &Room {
        match self {
            RoomAccess::Owned(room) | RoomAccess::Member(room) => room,
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, RoomAccess::Owned(_))
    }
}

/// Ownership wins over membership when both somehow apply.
pub async fn resolve_room(
    pool: &SqlitePool,
    user: &RoomUser,
) -> Result<RoomAccess, AccessError> {
    let owned: Option<Room> = sqlx::query_as(
        "SELECT id, name, created_at, created_by FROM rooms WHERE created_by = ?",
    )
    .bind(user.id)
    .fetch_optional(pool)
    .await?;
    if let Some(room) = owned {
        return Ok(RoomAccess::Owned(room));
    }

    if let Some(room_id) = user.member_of {
        let room: Option<Room> = sqlx::query_as(
            "SELECT id, name, created_at, created_by FROM rooms WHERE id = ?",
        )
        .bind(room_id)
        .fetch_optional(pool)
        .await?;
        if let Some(room) = room {
            return Ok(RoomAccess::Member(room));
        }
    }

    Err(AccessError::Denied)
}

/// Resolve and require that the user's room is the one named in the URL.
pub async fn resolve_room_checked(
    pool: &SqlitePool,
    user: &RoomUser,
    room_id: i64,
) -> Result<RoomAccess, AccessError> {
    let access = resolve_room(pool, user).await?;
    if access.room().id != room_id {
        return Err(AccessError::Denied);
    }
    Ok(access)
}

/// Load a topic and prove it lives in the user's room.
pub async fn topic_for_user(
    pool: &SqlitePool,
    user: &RoomUser,
    topic_id: i64,
) -> Result<(Topic, RoomAccess), AccessError> {
    let access = resolve_room(pool, user).await?;
    let topic: Option<Topic> = sqlx::query_as(
        "SELECT id, title, message, created_at, created_by, room_id \
         FROM topics WHERE id = ?",
    )
    .bind(topic_id)
    .fetch_optional(pool)
    .await?;
    match topic {
        Some(topic) if topic.room_id == access.room().id => Ok((topic, access)),
        _ => Err(AccessError::Denied),
    }
}

/// Owners may delete any topic in their room; members only their own.
pub fn can_delete(user: &RoomUser, access: &RoomAccess, topic: &Topic) -> bool {
    access.is_owner() || topic.created_by == user.id
}

pub async fn mark_read(
    pool: &SqlitePool,
    topic_id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO topic_reads (topic_id, user_id) VALUES (?, ?) \
         ON CONFLICT (topic_id, user_id) DO NOTHING",
    )
    .bind(topic_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
