use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenError;

/// Claims carried by an access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl Payload {
    pub fn new(username: &str, duration: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            issued_at,
            expired_at: issued_at + duration,
        }
    }

    /// Fails with [`TokenError::Expired`] once `expired_at` is past.
    pub fn valid(&self) -> Result<(), TokenError> {
        if Utc::now() > self.expired_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_payload_expires_after_duration() {
        let payload = Payload::new("alice", Duration::minutes(1));

        assert_eq!(payload.username, "alice");
        assert_eq!(payload.expired_at - payload.issued_at, Duration::minutes(1));
        assert!(payload.valid().is_ok());
    }

    #[test]
    fn negative_duration_is_already_expired() {
        let payload = Payload::new("alice", Duration::minutes(-1));
        assert_eq!(payload.valid(), Err(TokenError::Expired));
    }

    #[test]
    fn ids_are_unique() {
        let a = Payload::new("alice", Duration::minutes(1));
        let b = Payload::new("alice", Duration::minutes(1));
        assert_ne!(a.id, b.id);
    }
}
