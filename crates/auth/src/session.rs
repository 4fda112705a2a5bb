use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use epm_core::EmployeeNumber;

type HmacSha256 = Hmac<Sha256>;

/// Opaque session identifier (256 random bits, base64url without padding).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let mut buf = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut buf);
        Self(URL_SAFE_NO_PAD.encode(buf))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Session ids are bearer secrets; keep them out of debug output and logs.
impl core::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionId(..)")
    }
}

/// Server-side session bound to one employee.
///
/// The admin flag is deliberately absent: it is re-derived from the employee
/// record every time the session is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub employee_number: EmployeeNumber,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// "Remember me": the cookie outlives the browser session.
    pub remember: bool,
}

impl Session {
    pub fn issue(
        employee_number: EmployeeNumber,
        now: DateTime<Utc>,
        ttl: Duration,
        remember: bool,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            employee_number,
            issued_at: now,
            expires_at: now + ttl,
            remember,
        }
    }

    /// Remaining lifetime in whole seconds, floored at zero.
    pub fn max_age_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("session signing key must not be empty")]
    EmptyKey,
}

/// Deterministically validate a session's time window.
pub fn validate_session(session: &Session, now: DateTime<Utc>) -> Result<(), SessionError> {
    if session.expires_at <= session.issued_at {
        return Err(SessionError::InvalidTimeWindow);
    }
    if now < session.issued_at {
        return Err(SessionError::NotYetValid);
    }
    if now >= session.expires_at {
        return Err(SessionError::Expired);
    }
    Ok(())
}

/// Signs session ids for the cookie and verifies them on the way back in.
///
/// Cookie value format: `<session id>.<hex HMAC-SHA256(secret, session id)>`.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::EmptyKey);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| SessionError::EmptyKey)?;
        Ok(Self { mac })
    }

    pub fn sign(&self, id: &SessionId) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_str().as_bytes());
        let tag = mac.finalize().into_bytes();
        format!("{}.{}", id.as_str(), hex::encode(tag))
    }

    /// Recover the session id from a cookie value; `None` on any tampering.
    pub fn verify(&self, cookie_value: &str) -> Option<SessionId> {
        let (id, tag_hex) = cookie_value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let tag = hex::decode(tag_hex).ok()?;

        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&tag).ok()?;
        Some(SessionId(id.to_string()))
    }
}

impl core::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionSigner(..)")
    }
}

/// Severity of a one-shot user notice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Danger,
}

/// One-shot message shown on the next rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Danger,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>, ttl: Duration) -> Session {
        Session::issue(EmployeeNumber::new(202), now, ttl, false)
    }

    #[test]
    fn generated_ids_are_unique_and_url_safe() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn session_time_window() {
        let now = Utc::now();
        let s = session(now, Duration::minutes(10));

        assert_eq!(validate_session(&s, now), Ok(()));
        assert_eq!(
            validate_session(&s, now - Duration::seconds(1)),
            Err(SessionError::NotYetValid)
        );
        assert_eq!(
            validate_session(&s, now + Duration::minutes(10)),
            Err(SessionError::Expired)
        );
        assert_eq!(
            validate_session(&session(now, Duration::zero()), now),
            Err(SessionError::InvalidTimeWindow)
        );
    }

    #[test]
    fn signed_cookie_round_trips() {
        let signer = SessionSigner::new(b"test-secret").unwrap();
        let id = SessionId::generate();

        let value = signer.sign(&id);
        assert_eq!(signer.verify(&value), Some(id));
    }

    #[test]
    fn tampered_or_foreign_cookies_are_rejected() {
        let signer = SessionSigner::new(b"test-secret").unwrap();
        let other = SessionSigner::new(b"other-secret").unwrap();
        let id = SessionId::generate();
        let value = signer.sign(&id);

        assert_eq!(other.verify(&value), None);
        assert_eq!(signer.verify(id.as_str()), None);
        assert_eq!(signer.verify(&format!("x{value}")), None);
        assert_eq!(signer.verify(".deadbeef"), None);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(SessionSigner::new(b"").unwrap_err(), SessionError::EmptyKey);
    }

    #[test]
    fn debug_output_hides_session_id() {
        let id = SessionId::generate();
        assert_eq!(format!("{id:?}"), "SessionId(..)");
    }
}
