//! Bot fingerprinting for the public forms.
//!
//! `evaluate` is a pure function over request headers; it returns the set of
//! indicators that fired and leaves logging and policy to the caller. A
//! single indicator is weak evidence (privacy-minded browsers omit
//! Accept-Language, proxies strip Accept), so the suspicion threshold is two.

use axum::http::{header, HeaderMap};

const BOT_KEYWORDS: &[&str] = &[
    // HTTP clients
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "httpie",
    "httpclient",
    "okhttp",
    "axios",
    // Headless browsers & automation
    "headless",
    "phantomjs",
    "phantom",
    "selenium",
    "webdriver",
    "puppeteer",
    "playwright",
    "chromedriver",
    // Generic indicators
    "script",
    "bot",
    "crawler",
    "spider",
    "scraper",
    "automated",
    // Language runtimes that have no business filling in a signup form
    "python/",
    "java/",
    "go-http-client",
];

#[derive(Debug)]
pub struct BotSignals {
    pub indicators: Vec<String>,
}

impl BotSignals {
    pub fn is_suspicious(&self) -> bool {
        self.indicators.len() >= 2
    }
}

pub fn evaluate(headers: &HeaderMap) -> BotSignals {
    let mut indicators = Vec::new();

    let user_agent = header_str(headers, header::USER_AGENT).to_lowercase();
    let matched: Vec<&str> = BOT_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| user_agent.contains(kw))
        .collect();
    if !matched.is_empty() {
        indicators.push(format!("bot_user_agent ({})", matched.join(", ")));
    }

    if header_str(headers, header::ACCEPT).is_empty() {
        indicators.push("missing_accept_header".to_string());
    }
    if header_str(headers, header::ACCEPT_LANGUAGE).is_empty() {
        indicators.push("missing_accept_language".to_string());
    }

    BotSignals { indicators }
}

pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, header::HeaderName::from_static("x-forwarded-for"));
    if forwarded.is_empty() {
        "unknown".to_string()
    } else {
        forwarded.split(',').next().unwrap_or("unknown").trim().to_string()
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub const MIN_FORM_SECONDS: i64 = 3;
pub const MAX_FORM_SECONDS: i64 = 1800;

#[derive(Debug, PartialEq, Eq)]
pub enum TimingViolation {
    /// Submitted faster than a human can fill the form.
    TooFast,
    /// The rendered form is older than 30 minutes.
    Expired,
    /// Missing or non-numeric timestamp on a bound submission.
    Malformed,
}

/// Validate the hidden `timestamp` field a form was rendered with.
pub fn check_timestamp(raw: &str, now: i64) -> Result<(), TimingViolation> {
    let Ok(submitted) = raw.trim().parse::<i64>() else {
        return Err(TimingViolation::Malformed);
    };
    let elapsed = now - submitted;
    if elapsed < MIN_FORM_SECONDS {
        Err(TimingViolation::TooFast)
    } else if elapsed > MAX_FORM_SECONDS {
        Err(TimingViolation::Expired)
    } else {
        Ok(())
    }
}
