use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    accounts::{process_signup, SignupForm, SignupOutcome},
    config::AppConfig,
    db::{self, Room, RoomUser},
    email::MemoryMailer,
    now_ts,
    rooms::{self, access::RoomAccess},
};

pub struct TestApp {
    pub pool: sqlx::SqlitePool,
    pub mailer: Arc<MemoryMailer>,
    pub config: AppConfig,
}

pub async fn create_test_app() -> TestApp {
    let upload_dir: PathBuf =
        std::env::temp_dir().join(format!("teamglade-test-{}", Uuid::now_v7().simple()));
    TestApp {
        pool: db::open_in_memory().await.unwrap(),
        mailer: Arc::new(MemoryMailer::default()),
        config: AppConfig::for_tests(upload_dir),
    }
}

/// A well-formed signup submission: honeypots empty, timestamp plausibly
/// aged past the minimum fill time.
pub fn signup_form(username: &str, email: &str) -> SignupForm {
    SignupForm {
        username: username.to_string(),
        email: email.to_string(),
        password1: "correct-horse-battery".to_string(),
        password2: "correct-horse-battery".to_string(),
        website: String::new(),
        phone: String::new(),
        timestamp: (now_ts() - 5).to_string(),
    }
}

/// Sign up and activate a room owner, bypassing the email round trip.
pub async fn create_owner(app: &TestApp, username: &str) -> RoomUser {
    let form = signup_form(username, &format!("{username}@test.com"));
    let outcome = process_signup(&app.pool, app.mailer.as_ref(), &app.config, form, false)
        .await
        .unwrap();
    let SignupOutcome::Created { user_id, .. } = outcome else {
        panic!("signup rejected in test setup");
    };
    sqlx::query("UPDATE users SET is_active = 1 WHERE id = ?")
        .bind(user_id)
        .execute(&app.pool)
        .await
        .unwrap();
    db::get_user(&app.pool, user_id).await.unwrap().unwrap()
}

pub async fn owned_room(app: &TestApp, owner: &RoomUser) -> Room {
    match rooms::access::resolve_room(&app.pool, owner).await.unwrap() {
        RoomAccess::Owned(room) => room,
        RoomAccess::Member(_) => panic!("expected ownership"),
    }
}

/// Invite `email` into the owner's room and return the created member.
pub async fn create_member(app: &TestApp, owner: &RoomUser, email: &str) -> RoomUser {
    let room = owned_room(app, owner).await;
    rooms::send_invite(
        &app.pool,
        app.mailer.as_ref(),
        &app.config,
        owner,
        room.id,
        email,
    )
    .await
    .unwrap();
    db::get_user_by_username(&app.pool, email)
        .await
        .unwrap()
        .unwrap()
}

pub async fn create_topic(app: &TestApp, room_id: i64, user_id: i64, title: &str) -> i64 {
    rooms::create_topic(
        &app.pool,
        &app.config.upload_dir,
        room_id,
        user_id,
        title,
        "topic body",
        Vec::new(),
    )
    .await
    .unwrap()
}

/// Pull the uidb64 and token out of a confirmation email body.
pub fn confirmation_link_parts(body: &str) -> (String, String) {
    let marker = "/signup/email-confirmed/";
    let start = body.find(marker).expect("no confirmation link in body");
    let rest = body[start + marker.len()..]
        .split_whitespace()
        .next()
        .unwrap();
    let (uidb64, token) = rest.split_once('/').expect("malformed confirmation link");
    (uidb64.to_string(), token.to_string())
}

/// Pull the invite code out of an invitation email body.
pub fn invite_code_from(body: &str) -> String {
    let marker = "/rooms/invite/";
    let start = body.find(marker).expect("no invite link in body");
    body[start + marker.len()..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}
