mod confirm;
mod login;
mod signup;
mod update;

pub mod passwords;
pub mod tokens;

pub use confirm::{confirm_email, issue_confirmation, resend_email, ConfirmOutcome,
    CONFIRMATION_SUBJECT};
pub use signup::{process_signup, FieldError, SignupForm, SignupOutcome};
pub use update::{account_view, update_account_details, AccountView, UpdateOutcome};

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup::signup_page).post(signup::signup))
        .route(
            "/signup/email-confirmation/{uidb64}",
            get(confirm::email_confirmation).post(confirm::email_confirmation),
        )
        .route(
            "/signup/email-confirmed/{uidb64}/{token}",
            get(confirm::email_confirmed).post(confirm::email_confirmed),
        )
        .route("/signup/email-resend/{uidb64}", get(confirm::email_resend))
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(login::logout))
        .route(
            "/settings/account",
            get(update::my_account).post(update::update_account),
        )
}
