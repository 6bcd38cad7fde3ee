//! Stateless admin sessions.
//!
//! A token is `<issued-at unix millis>.<base64url HMAC-SHA256 of the millis>`.
//! There is no server-side revocation: logout clears the cookie, and a copied
//! token stays valid until it expires.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AppError;

pub const SESSION_COOKIE: &str = "ebomi_admin";
pub const MAX_AGE_SECS: i64 = 60 * 60 * 24;
pub const MIN_SECRET_LEN: usize = 16;

#[derive(Clone)]
pub struct SessionSigner {
    mac: Hmac<Sha256>,
    max_age: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: Option<&str>) -> Result<Self, AppError> {
        let secret = match secret {
            Some(s) if s.len() >= MIN_SECRET_LEN => s,
            _ => {
                return Err(AppError::Config(format!(
                    "ADMIN_SESSION_SECRET must be set and at least {MIN_SECRET_LEN} characters"
                )))
            }
        };
        let mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::Config(format!("invalid session secret: {e}")))?;
        Ok(Self {
            mac,
            max_age: Duration::seconds(MAX_AGE_SECS),
        })
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn issue(&self) -> String {
        self.issue_at(Utc::now())
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> String {
        let timestamp = now.timestamp_millis().to_string();
        let signature = self.sign(&timestamp);
        format!("{timestamp}.{signature}")
    }

    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, Utc::now())
    }

    /// Never errors: every malformed, forged or stale token is just `false`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let Some((timestamp, signature)) = token.split_once('.') else {
            return false;
        };
        if timestamp.is_empty() || signature.is_empty() {
            return false;
        }

        let expected = self.sign(timestamp);
        if !constant_time_eq::constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return false;
        }

        let Ok(issued_millis) = timestamp.parse::<i64>() else {
            return false;
        };
        now.timestamp_millis() - issued_millis <= self.max_age.num_milliseconds()
    }

    fn sign(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Pulls the session token out of a `Cookie` request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-very-long-test-secret";

    fn signer() -> SessionSigner {
        SessionSigner::new(Some(SECRET)).unwrap()
    }

    #[test]
    fn short_or_missing_secret_is_config_error() {
        assert!(matches!(SessionSigner::new(None), Err(AppError::Config(_))));
        assert!(matches!(
            SessionSigner::new(Some("too-short")),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn fresh_token_verifies() {
        let s = signer();
        assert!(s.verify(&s.issue()));
    }

    #[test]
    fn valid_until_exactly_max_age() {
        let s = signer();
        let issued = Utc::now();
        let token = s.issue_at(issued);
        let max_age = Duration::seconds(MAX_AGE_SECS);

        assert!(s.verify_at(&token, issued + max_age - Duration::seconds(1)));
        assert!(s.verify_at(&token, issued + max_age));
        assert!(!s.verify_at(&token, issued + max_age + Duration::seconds(1)));
    }

    #[test]
    fn token_from_25_hours_ago_is_rejected() {
        let s = signer();
        let token = s.issue_at(Utc::now() - Duration::hours(25));
        assert!(!s.verify(&token));
    }

    #[test]
    fn flipped_signature_character_is_rejected() {
        let s = signer();
        let token = s.issue();
        let (ts, sig) = token.split_once('.').unwrap();
        let mut chars: Vec<char> = sig.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let forged = format!("{ts}.{}", chars.into_iter().collect::<String>());
        assert!(!s.verify(&forged));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let s = signer();
        let token = s.issue();
        assert!(!s.verify(&token.replace('.', "")));
        assert!(!s.verify(""));
        assert!(!s.verify("."));
        assert!(!s.verify("not-a-number.abc"));
    }

    #[test]
    fn tampered_timestamp_is_rejected() {
        let s = signer();
        let token = s.issue();
        let (ts, sig) = token.split_once('.').unwrap();
        let later: i64 = ts.parse::<i64>().unwrap() + 1000;
        assert!(!s.verify(&format!("{later}.{sig}")));
    }

    #[test]
    fn other_secret_rejects_token() {
        let other = SessionSigner::new(Some("another-long-secret-value")).unwrap();
        assert!(!other.verify(&signer().issue()));
    }

    #[test]
    fn reads_token_from_cookie_header() {
        let header = "theme=dark; ebomi_admin=123.abc; other=1";
        assert_eq!(token_from_cookie_header(header), Some("123.abc"));
        assert_eq!(token_from_cookie_header("ebomi_admin="), None);
        assert_eq!(token_from_cookie_header("theme=dark"), None);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("t", MAX_AGE_SECS, true);
        assert!(cookie.starts_with("ebomi_admin=t;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
