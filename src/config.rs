//! Environment-driven configuration.
//!
//! ```bash
//! DATABASE_URL=sqlite://teamglade.db
//! SECRET_KEY=...                     # signs email confirmation tokens
//! BASE_URL=https://teamglade.example # absolute links in outbound email
//! BIND_ADDR=0.0.0.0:8080
//! OPERATOR_EMAIL=info@teamglade.com  # contact form recipient
//! UPLOAD_DIR=uploads
//!
//! # Optional SMTP; outbound email is logged and dropped when unset
//! SMTP_HOST=smtp.example.com
//! SMTP_PORT=587
//! SMTP_USERNAME=...
//! SMTP_PASSWORD=...
//! SMTP_USE_TLS=true
//! EMAIL_FROM=noreply@teamglade.com
//! ```

use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub base_url: String,
    pub secret_key: String,
    pub operator_email: String,
    pub upload_dir: PathBuf,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_address: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("invalid SMTP_PORT: {0}")]
    InvalidPort(String),

    #[error("EMAIL_FROM is required when SMTP_HOST is set")]
    SmtpMissingFrom,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL"))?;
        let secret_key =
            env::var("SECRET_KEY").map_err(|_| ConfigError::MissingEnvVar("SECRET_KEY"))?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let operator_email =
            env::var("OPERATOR_EMAIL").unwrap_or_else(|_| "info@teamglade.com".to_string());
        let upload_dir =
            PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));

        let smtp = match env::var("SMTP_HOST") {
            Err(_) => None,
            Ok(host) => {
                let port = match env::var("SMTP_PORT") {
                    Err(_) => 587,
                    Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
                };
                let from_address =
                    env::var("EMAIL_FROM").map_err(|_| ConfigError::SmtpMissingFrom)?;
                Some(SmtpConfig {
                    host,
                    port,
                    username: env::var("SMTP_USERNAME").ok(),
                    password: env::var("SMTP_PASSWORD").ok(),
                    use_tls: env::var("SMTP_USE_TLS")
                        .map(|v| v.to_lowercase() == "true" || v == "1")
                        .unwrap_or(true),
                    from_address,
                })
            }
        };

        Ok(Self {
            database_url,
            bind_addr,
            base_url,
            secret_key,
            operator_email,
            upload_dir,
            smtp,
        })
    }

    #[cfg(test)]
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            base_url: "http://testserver".to_string(),
            secret_key: "test-secret-key".to_string(),
            operator_email: "operator@teamglade.test".to_string(),
            upload_dir,
            smtp: None,
        }
    }
}
