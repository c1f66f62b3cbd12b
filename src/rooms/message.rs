//! The anonymous contact form. Unlike signup, spam here is discarded
//! silently: the bot sees a normal redirect home and nothing is sent.

use axum::{
    debug_handler,
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    botcheck, config::AppConfig, email::Mailer, include_res, is_valid_email, AppResult, AppState,
};

pub const NAME_MAX: usize = 30;
pub const MESSAGE_MAX: usize = 190;
pub const PHONE_MAX: usize = 16;

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub email_confirmation: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    Sent,
    Discarded,
}

pub async fn process_message(
    mailer: &dyn Mailer,
    config: &AppConfig,
    form: MessageForm,
    suspicious_client: bool,
) -> AppResult<MessageOutcome> {
    if suspicious_client
        || !form.website.trim().is_empty()
        || !form.email_confirmation.trim().is_empty()
    {
        return Ok(MessageOutcome::Discarded);
    }

    let name = form.name.trim();
    let email = form.email.trim();
    let phone = form.phone.trim();
    let message = form.message.trim();
    if name.is_empty()
        || name.chars().count() > NAME_MAX
        || message.is_empty()
        || message.chars().count() > MESSAGE_MAX
        || phone.chars().count() > PHONE_MAX
        || !is_valid_email(email)
    {
        return Ok(MessageOutcome::Discarded);
    }

    let subject = format!("Site visitor's message. [{name}]");
    let body = format!("{message}\n{phone}\n{email}");
    mailer.send(&config.operator_email, &subject, &body).await?;

    Ok(MessageOutcome::Sent)
}

#[debug_handler]
pub(crate) async fn message_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/message.html"))
}

#[debug_handler(state = AppState)]
pub(crate) async fn message(
    State(mailer): State<Arc<dyn Mailer>>,
    State(config): State<AppConfig>,
    headers: HeaderMap,
    Form(form): Form<MessageForm>,
) -> AppResult<Response> {
    let signals = botcheck::evaluate(&headers);
    if signals.is_suspicious() {
        tracing::warn!(
            ip = %botcheck::client_ip(&headers),
            indicators = ?signals.indicators,
            "suspicious contact message"
        );
    }

    match process_message(mailer.as_ref(), &config, form, signals.is_suspicious()).await? {
        MessageOutcome::Sent => {
            Ok(Html(include_res!(str, "/pages/message_sent.html")).into_response())
        }
        MessageOutcome::Discarded => Ok(Redirect::to("/").into_response()),
    }
}
