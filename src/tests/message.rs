use crate::rooms::{process_message, MessageForm, MessageOutcome};

use super::common::create_test_app;

fn valid_form() -> MessageForm {
    MessageForm {
        name: "Dana".to_string(),
        email: "dana@test.com".to_string(),
        phone: "555-0100".to_string(),
        message: "Hello, I have a question about rooms.".to_string(),
        website: String::new(),
        email_confirmation: String::new(),
    }
}

#[tokio::test]
async fn visitor_message_reaches_the_operator() {
    let app = create_test_app().await;

    let outcome = process_message(app.mailer.as_ref(), &app.config, valid_form(), false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Sent);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, app.config.operator_email);
    assert_eq!(sent[0].subject, "Site visitor's message. [Dana]");
    assert_eq!(
        sent[0].body,
        "Hello, I have a question about rooms.\n555-0100\ndana@test.com"
    );
}

#[tokio::test]
async fn empty_phone_is_fine() {
    let app = create_test_app().await;
    let mut form = valid_form();
    form.phone = String::new();

    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Sent);
    let sent = app.mailer.sent();
    assert_eq!(
        sent[0].body,
        "Hello, I have a question about rooms.\n\ndana@test.com"
    );
}

#[tokio::test]
async fn filled_honeypots_discard_silently() {
    let app = create_test_app().await;

    let mut form = valid_form();
    form.website = "http://spam.example".to_string();
    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);

    let mut form = valid_form();
    form.email_confirmation = "dana@test.com".to_string();
    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn suspicious_client_is_discarded() {
    let app = create_test_app().await;

    let outcome = process_message(app.mailer.as_ref(), &app.config, valid_form(), true)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn oversized_fields_are_discarded() {
    let app = create_test_app().await;

    let mut form = valid_form();
    form.name = "n".repeat(31);
    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);

    let mut form = valid_form();
    form.message = "m".repeat(191);
    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);

    let mut form = valid_form();
    form.phone = "5".repeat(17);
    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn invalid_sender_email_is_discarded() {
    let app = create_test_app().await;
    let mut form = valid_form();
    form.email = "not-an-email".to_string();

    let outcome = process_message(app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Discarded);
    assert!(app.mailer.sent().is_empty());
}
