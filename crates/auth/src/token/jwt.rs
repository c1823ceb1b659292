use chrono::Duration;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use super::{Maker, Payload, TokenError};

const MIN_SECRET_KEY_SIZE: usize = 32;

/// Registered claims next to the payload, so generic JWT tooling can read the
/// expiry.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    payload: Payload,
    iat: i64,
    exp: i64,
}

/// HS256 JSON Web Tokens.
pub struct JwtMaker {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtMaker {
    pub fn new(secret_key: &str) -> Result<Self, TokenError> {
        if secret_key.len() < MIN_SECRET_KEY_SIZE {
            return Err(TokenError::InvalidKeySize(format!(
                "must be at least {MIN_SECRET_KEY_SIZE} characters"
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(secret_key.as_bytes()),
        })
    }
}

impl Maker for JwtMaker {
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(username, duration);
        let claims = Claims {
            iat: payload.issued_at.timestamp(),
            exp: payload.expired_at.timestamp(),
            payload,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |err| {
                tracing::error!("cannot sign token: {err}");
                TokenError::Invalid
            },
        )?;
        Ok((token, claims.payload))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        // Only HS256 is accepted, `none` included.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        let payload = data.claims.payload;
        payload.valid()?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn created_token_verifies() {
        let maker = JwtMaker::new(KEY).unwrap();

        let (token, payload) = maker.create_token("alice", Duration::minutes(1)).unwrap();
        let verified = maker.verify_token(&token).unwrap();

        assert_eq!(verified.id, payload.id);
        assert_eq!(verified.username, "alice");
        // The registered claims only have second precision.
        assert!((verified.issued_at - payload.issued_at).num_seconds().abs() <= 1);
        assert!((verified.expired_at - payload.expired_at).num_seconds().abs() <= 1);
    }

    #[test]
    fn expired_token_is_rejected() {
        let maker = JwtMaker::new(KEY).unwrap();

        let (token, _) = maker.create_token("alice", Duration::minutes(-1)).unwrap();

        assert_eq!(maker.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let maker = JwtMaker::new(KEY).unwrap();
        let payload = Payload::new("alice", Duration::minutes(1));
        let claims = Claims {
            iat: payload.issued_at.timestamp(),
            exp: payload.expired_at.timestamp(),
            payload,
        };

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let token = format!("{header}.{body}.");

        assert_eq!(maker.verify_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn other_algorithm_or_key_is_rejected() {
        let maker = JwtMaker::new(KEY).unwrap();
        let payload = Payload::new("alice", Duration::minutes(1));
        let claims = Claims {
            iat: payload.issued_at.timestamp(),
            exp: payload.expired_at.timestamp(),
            payload,
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(KEY.as_bytes()),
        )
        .unwrap();
        assert_eq!(maker.verify_token(&hs512), Err(TokenError::Invalid));

        let other = JwtMaker::new("fedcba9876543210fedcba9876543210").unwrap();
        let (token, _) = other.create_token("alice", Duration::minutes(1)).unwrap();
        assert_eq!(maker.verify_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn short_secret_is_refused() {
        assert!(matches!(
            JwtMaker::new("too-short"),
            Err(TokenError::InvalidKeySize(_))
        ));
    }
}
