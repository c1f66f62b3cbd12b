mod delete;
mod message;
mod new_topic;
mod room;
mod topic;

pub mod access;
pub mod invite;

pub use delete::delete_topic;
pub use invite::{generate_invite_code, login_via_code, send_invite, InviteOutcome,
    INVITE_SUBJECT};
pub use message::{process_message, MessageForm, MessageOutcome};
pub use new_topic::{create_topic, NewFile};

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(room::room))
        .route(
            "/rooms/{pk}/new",
            get(new_topic::new_topic_page).post(new_topic::new_topic),
        )
        .route(
            "/rooms/{pk}/invite",
            get(invite::invite_page).post(invite::invite),
        )
        .route("/rooms/invite/{code}", get(invite::login_invited))
        .route("/topic/{pk}", get(topic::topic))
        .route(
            "/topic/{pk}/delete",
            get(delete::delete_page).post(delete::delete),
        )
        .route("/files/{pk}", get(topic::file))
        .route(
            "/message",
            get(message::message_page).post(message::message),
        )
}
