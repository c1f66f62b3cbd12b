use crate::accounts::{process_signup, SignupOutcome, CONFIRMATION_SUBJECT};
use crate::now_ts;

use super::common::{create_test_app, signup_form};

async fn user_count(pool: &sqlx::SqlitePool) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

#[tokio::test]
async fn signup_creates_inactive_user_with_own_room() {
    let app = create_test_app().await;
    let form = signup_form("alice", "alice@test.com");

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Created { user_id, uidb64 } = outcome else {
        panic!("expected a created account");
    };

    let user = crate::db::get_user(&app.pool, user_id).await.unwrap().unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@test.com");
    assert!(!user.is_active);
    assert!(user.invite_code.is_none());

    let (room_name, created_by): (String, i64) =
        sqlx::query_as("SELECT name, created_by FROM rooms WHERE created_by = ?")
            .bind(user_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(room_name, "alice");
    assert_eq!(created_by, user_id);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@test.com");
    assert_eq!(sent[0].subject, CONFIRMATION_SUBJECT);
    assert!(sent[0]
        .body
        .contains(&format!("/signup/email-confirmed/{uidb64}/")));
}

#[tokio::test]
async fn long_usernames_get_a_clamped_room_name() {
    let app = create_test_app().await;
    let username = "a".repeat(40);
    let form = signup_form(&username, "long@test.com");

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Created { user_id, .. } = outcome else {
        panic!("expected a created account");
    };

    let (room_name,): (String,) =
        sqlx::query_as("SELECT name FROM rooms WHERE created_by = ?")
            .bind(user_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(room_name.chars().count(), 30);
    assert_eq!(room_name, "a".repeat(30));
}

#[tokio::test]
async fn filled_honeypot_rejects_and_persists_nothing() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.website = "http://spam.example".to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors
        .iter()
        .any(|e| e.field == "website" && e.message == "Spam detected."));
    assert_eq!(user_count(&app.pool).await, 0);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn filled_phone_honeypot_rejects() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.phone = "555-0100".to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors.iter().any(|e| e.field == "phone"));
}

#[tokio::test]
async fn instant_submission_is_too_fast() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.timestamp = now_ts().to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors.iter().any(|e| e.field == "timestamp"
        && e.message == "Form was submitted too quickly. Please try again."));
}

#[tokio::test]
async fn stale_form_session_is_expired() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.timestamp = (now_ts() - 3600).to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors.iter().any(|e| e.field == "timestamp"
        && e.message == "This form session has expired. Please reload the page and try again."));
}

#[tokio::test]
async fn garbage_timestamp_is_invalid_form_data() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.timestamp = "not-a-number".to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors
        .iter()
        .any(|e| e.field == "timestamp" && e.message == "Invalid form data."));
}

#[tokio::test]
async fn suspicious_client_fingerprint_rejects() {
    let app = create_test_app().await;
    let form = signup_form("alice", "alice@test.com");

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, true)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors
        .iter()
        .any(|e| e.field == "__all__" && e.message == "Spam detected."));
    assert_eq!(user_count(&app.pool).await, 0);
}

#[tokio::test]
async fn duplicate_username_rejects() {
    let app = create_test_app().await;
    let first = signup_form("alice", "alice@test.com");
    process_signup(&app.pool, app.mailer.as_ref(), &app.config, first, false)
        .await
        .unwrap();

    let second = signup_form("alice", "other@test.com");
    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, second, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors
        .iter()
        .any(|e| e.field == "username"
            && e.message == "A user with that username already exists."));
    assert_eq!(user_count(&app.pool).await, 1);
}

#[tokio::test]
async fn short_password_rejects() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.password1 = "short".to_string();
    form.password2 = "short".to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors.iter().any(|e| e.field == "password1"));
}

#[tokio::test]
async fn mismatched_passwords_reject() {
    let app = create_test_app().await;
    let mut form = signup_form("alice", "alice@test.com");
    form.password2 = "different-password".to_string();

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors
        .iter()
        .any(|e| e.field == "password2"
            && e.message == "The two password fields didn't match."));
}

#[tokio::test]
async fn invalid_email_rejects() {
    let app = create_test_app().await;
    let form = signup_form("alice", "not-an-email");

    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Invalid { errors, .. } = outcome else {
        panic!("expected rejection");
    };
    assert!(errors.iter().any(|e| e.field == "email"));
}
