use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Fixed lifetime of every session token.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Claims carried by a session token.
///
/// Identity only: subject and the kind of actor it names. Registered JWT names
/// are used on the wire so standard validation applies to `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (actor identifier)
    pub sub: String,

    /// Actor kind the subject belongs to
    pub kind: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims issued at `issued_at`, expiring one session lifetime later.
    pub fn issue(subject: impl ToString, kind: impl ToString, issued_at: DateTime<Utc>) -> Self {
        let expires_at = issued_at + Duration::hours(SESSION_LIFETIME_HOURS);

        Self {
            sub: subject.to_string(),
            kind: kind.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
