use axum::{
    debug_handler,
    response::{Html, IntoResponse},
};

use crate::include_res;

#[debug_handler]
pub async fn index() -> impl IntoResponse {
    Html(include_res!(str, "/pages/index.html"))
}
