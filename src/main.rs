use std::sync::Arc;

use axum::{routing::get, Router};
use teamglade::{
    accounts, config::AppConfig, db,
    email::{LogMailer, Mailer, SmtpMailer},
    index, rooms, AppState,
};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let db_pool = db::open(&config.database_url).await?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            tracing::warn!("SMTP not configured, outbound email is disabled");
            Arc::new(LogMailer)
        }
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)));

    let app_state = AppState {
        db_pool,
        mailer,
        config: config.clone(),
    };

    let app = Router::new()
        .route("/", get(index::index))
        .merge(accounts::router())
        .merge(rooms::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
