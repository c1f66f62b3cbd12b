//! Email confirmation tokens and encoded identity references.
//!
//! The uidb64 reference is the URL-safe base64 of the decimal user id. The
//! token is `base36(issue_ts)-b64(mac)` where the MAC covers the user id,
//! the password hash and the issue timestamp. Binding the password hash
//! means a password change invalidates outstanding tokens; the active flag
//! is deliberately not bound, so confirming twice with the same token is an
//! idempotent success rather than an error.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::db::RoomUser;

type HmacSha256 = Hmac<Sha256>;

pub fn encode_uid(id: i64) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(s: &str) -> Option<i64> {
    let bytes = URL_SAFE_NO_PAD.decode(s).ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}

pub fn make_token(secret: &str, user: &RoomUser, now: i64) -> String {
    let ts = to_base36(now.max(0) as u64);
    let sig = signature(secret, user, &ts).finalize().into_bytes();
    format!("{ts}-{}", URL_SAFE_NO_PAD.encode(sig))
}

pub fn check_token(secret: &str, user: &RoomUser, token: &str) -> bool {
    let Some((ts, sig)) = token.split_once('-') else {
        return false;
    };
    if from_base36(ts).is_none() {
        return false;
    }
    let Ok(claimed) = URL_SAFE_NO_PAD.decode(sig) else {
        return false;
    };
    // verify_slice is constant-time
    signature(secret, user, ts).verify_slice(&claimed).is_ok()
}

fn signature(secret: &str, user: &RoomUser, ts: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(user.id.to_string().as_bytes());
    mac.update(b"\x00");
    mac.update(user.password_hash.as_bytes());
    mac.update(b"\x00");
    mac.update(ts.as_bytes());
    mac
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.iter().rev().collect()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for c in s.chars() {
        let d = c.to_digit(36)?;
        n = n.checked_mul(36)?.checked_add(u64::from(d))?;
    }
    Some(n)
}
