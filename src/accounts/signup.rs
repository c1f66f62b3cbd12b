use axum::{
    debug_handler,
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    botcheck::{self, TimingViolation},
    config::AppConfig,
    db,
    email::Mailer,
    include_res, is_valid_email, now_ts, res, AppResult, AppState,
};

use super::{confirm, passwords, update};

pub const USERNAME_MAX: usize = 150;
pub const PASSWORD_MIN: usize = 8;

/// The honeypot fields deserialize with defaults: a client that never
/// renders them must not be blocked, while a bot that fills them is.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum SignupOutcome {
    Created { user_id: i64, uidb64: String },
    Invalid { errors: Vec<FieldError>, form: SignupForm },
}

/// Validate and persist a signup. Honeypot and timing failures are loud
/// field errors so a legitimate user can retry; nothing is persisted and no
/// email is sent unless every check passes.
pub async fn process_signup(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    config: &AppConfig,
    form: SignupForm,
    suspicious_client: bool,
) -> AppResult<SignupOutcome> {
    let mut errors = Vec::new();

    if !form.website.trim().is_empty() {
        errors.push(FieldError::new("website", "Spam detected."));
    }
    if !form.phone.trim().is_empty() {
        errors.push(FieldError::new("phone", "Spam detected."));
    }
    match botcheck::check_timestamp(&form.timestamp, now_ts()) {
        Ok(()) => {}
        Err(TimingViolation::TooFast) => errors.push(FieldError::new(
            "timestamp",
            "Form was submitted too quickly. Please try again.",
        )),
        Err(TimingViolation::Expired) => errors.push(FieldError::new(
            "timestamp",
            "This form session has expired. Please reload the page and try again.",
        )),
        Err(TimingViolation::Malformed) => {
            errors.push(FieldError::new("timestamp", "Invalid form data."))
        }
    }
    if suspicious_client {
        errors.push(FieldError::new("__all__", "Spam detected."));
    }

    let username = form.username.trim();
    if username.is_empty() {
        errors.push(FieldError::new("username", "This field is required."));
    } else if username.chars().count() > USERNAME_MAX {
        errors.push(FieldError::new(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX} characters."),
        ));
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.push(FieldError::new(
            "username",
            "Enter a valid username. Letters, digits and @.+-_ only.",
        ));
    }

    if !is_valid_email(form.email.trim()) {
        errors.push(FieldError::new("email", "Enter a valid email address."));
    }

    if form.password1.chars().count() < PASSWORD_MIN {
        errors.push(FieldError::new(
            "password1",
            format!("This password is too short. It must contain at least {PASSWORD_MIN} characters."),
        ));
    }
    if form.password1 != form.password2 {
        errors.push(FieldError::new(
            "password2",
            "The two password fields didn't match.",
        ));
    }

    if errors.is_empty() {
        let taken: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        if taken.is_some() {
            errors.push(FieldError::new(
                "username",
                "A user with that username already exists.",
            ));
        }
    }

    if !errors.is_empty() {
        return Ok(SignupOutcome::Invalid { errors, form });
    }

    let password_hash = passwords::hash_password(&form.password1)?;
    let now = now_ts();
    let inserted = sqlx::query(
        "INSERT INTO users (username, email, password_hash, is_active, created_at) \
         VALUES (?, ?, ?, 0, ?)",
    )
    .bind(username)
    .bind(form.email.trim())
    .bind(&password_hash)
    .bind(now)
    .execute(pool)
    .await;

    // Concurrent signups racing on the same username are serialized by the
    // unique constraint; the loser gets the same field error.
    let user_id = match inserted {
        Ok(result) => result.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok(SignupOutcome::Invalid {
                errors: vec![FieldError::new(
                    "username",
                    "A user with that username already exists.",
                )],
                form,
            });
        }
        Err(e) => return Err(e.into()),
    };

    // Usernames run longer than room names; clamp the default.
    let room_name: String = username.chars().take(update::ROOM_NAME_MAX).collect();
    sqlx::query("INSERT INTO rooms (name, created_at, created_by) VALUES (?, ?, ?)")
        .bind(&room_name)
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await?;

    let user = db::get_user(pool, user_id)
        .await?
        .ok_or("signup: user vanished after insert")?;
    let uidb64 = confirm::issue_confirmation(mailer, config, &user).await?;

    Ok(SignupOutcome::Created { user_id, uidb64 })
}

#[debug_handler]
pub(crate) async fn signup_page() -> impl IntoResponse {
    Html(render_form("", "", "", now_ts()))
}

#[debug_handler(state = AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    State(mailer): State<Arc<dyn Mailer>>,
    State(config): State<AppConfig>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let signals = botcheck::evaluate(&headers);
    if !signals.indicators.is_empty() {
        tracing::warn!(
            ip = %botcheck::client_ip(&headers),
            indicators = ?signals.indicators,
            "suspicious signup attempt"
        );
    }

    match process_signup(
        &db_pool,
        mailer.as_ref(),
        &config,
        form,
        signals.is_suspicious(),
    )
    .await?
    {
        SignupOutcome::Created { uidb64, .. } => Ok(Redirect::to(&format!(
            "/signup/email-confirmation/{uidb64}"
        ))
        .into_response()),
        SignupOutcome::Invalid { errors, form } => Ok(Html(render_form(
            &errors_html(&errors),
            &form.username,
            &form.email,
            now_ts(),
        ))
        .into_response()),
    }
}

fn render_form(errors: &str, username: &str, email: &str, timestamp: i64) -> String {
    include_res!(str, "/pages/signup.html")
        .replace("{errors}", errors)
        .replace("{username}", &res::escape(username))
        .replace("{email}", &res::escape(email))
        .replace("{timestamp}", &timestamp.to_string())
}

pub(crate) fn errors_html(errors: &[FieldError]) -> String {
    let mut out = String::from("<ul class=\"errors\">");
    for e in errors {
        out += &format!("<li>{}: {}</li>", e.field, res::escape(&e.message));
    }
    out += "</ul>";
    out
}
