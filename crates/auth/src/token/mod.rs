use chrono::Duration;
use thiserror::Error;

mod jwt;
mod paseto;
mod payload;

pub use jwt::JwtMaker;
pub use paseto::PasetoMaker;
pub use payload::Payload;

/// Token failures.
///
/// Verification never says which check failed, a token is either expired or
/// invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
    #[error("invalid key size: {0}")]
    InvalidKeySize(String),
}

/// Issues and verifies access tokens.
pub trait Maker: Send + Sync {
    /// Create a token for `username` valid for `duration`, together with the
    /// payload it carries.
    fn create_token(&self, username: &str, duration: Duration)
    -> Result<(String, Payload), TokenError>;

    /// Check a token and return its payload.
    fn verify_token(&self, token: &str) -> Result<Payload, TokenError>;
}
