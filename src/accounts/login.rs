use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult, AppState};

use super::passwords;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextQuery {
    next: Option<String>,
}

#[debug_handler]
pub(crate) async fn login_page(Query(query): Query<NextQuery>) -> impl IntoResponse {
    Html(render_form(query.next.as_deref().unwrap_or(""), ""))
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    session: Session,
    State(db_pool): State<SqlitePool>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = db::get_user_by_username(&db_pool, form.username.trim()).await?;
    let authenticated = user
        .as_ref()
        .filter(|u| u.is_active)
        .filter(|u| passwords::verify_password(&form.password, &u.password_hash));

    let Some(user) = authenticated else {
        tracing::warn!(username = %form.username.trim(), "failed login");
        return Ok(Html(render_form(&form.next, "Invalid username or password.")).into_response());
    };

    session.insert(session::USER_ID, user.id).await?;
    tracing::info!(user_id = user.id, "login");

    Ok(Redirect::to(sanitize_next(&form.next)).into_response())
}

/// Only same-site targets are honored as a post-login destination. A
/// protocol-relative `//host` would leave the site, so a second leading
/// slash disqualifies too.
fn sanitize_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/rooms"
    }
}

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Redirect> {
    session.clear().await;
    Ok(Redirect::to("/"))
}

fn render_form(next: &str, error: &str) -> String {
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"errors\"><li>{}</li></ul>", res::escape(error))
    };
    include_res!(str, "/pages/login.html")
        .replace("{next}", &res::escape(next))
        .replace("{error}", &error_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_accepts_only_site_local_paths() {
        assert_eq!(sanitize_next("/topic/3"), "/topic/3");
        assert_eq!(sanitize_next("/settings/account"), "/settings/account");
        assert_eq!(sanitize_next(""), "/rooms");
        assert_eq!(sanitize_next("https://evil.example"), "/rooms");
        assert_eq!(sanitize_next("//evil.example"), "/rooms");
    }
}
