//! `v2.local` tokens: the JSON payload sealed with XChaCha20-Poly1305.
//!
//! Layout: `v2.local.` followed by the unpadded base64url encoding of
//! `nonce || ciphertext`. The header and nonce are bound to the ciphertext as
//! associated data through the pre-authentication encoding, so a token cut
//! and pasted under another header fails to open.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload as Sealed},
};
use chrono::Duration;

use super::{Maker, Payload, TokenError};

const HEADER: &str = "v2.local.";
const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 24;
const TAG_SIZE: usize = 16;

pub struct PasetoMaker {
    cipher: XChaCha20Poly1305,
}

impl PasetoMaker {
    pub fn new(symmetric_key: &str) -> Result<Self, TokenError> {
        let key = symmetric_key.as_bytes();
        if key.len() != KEY_SIZE {
            return Err(TokenError::InvalidKeySize(format!(
                "must be exactly {KEY_SIZE} characters"
            )));
        }
        let cipher = XChaCha20Poly1305::new_from_slice(key)
            .map_err(|err| TokenError::InvalidKeySize(err.to_string()))?;
        Ok(Self { cipher })
    }
}

/// Pre-authentication encoding: the piece count, then each piece prefixed by
/// its length, all as little-endian 64 bit integers with the top bit clear.
fn pae(pieces: &[&[u8]]) -> Vec<u8> {
    fn le64(n: usize) -> [u8; 8] {
        ((n as u64) & (u64::MAX >> 1)).to_le_bytes()
    }

    let mut out = Vec::with_capacity(8 + pieces.iter().map(|p| 8 + p.len()).sum::<usize>());
    out.extend_from_slice(&le64(pieces.len()));
    for piece in pieces {
        out.extend_from_slice(&le64(piece.len()));
        out.extend_from_slice(piece);
    }
    out
}

impl Maker for PasetoMaker {
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(username, duration);
        let message = serde_json::to_vec(&payload).map_err(|_| TokenError::Invalid)?;

        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let aad = pae(&[HEADER.as_bytes(), nonce.as_slice(), b""]);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Sealed {
                    msg: &message,
                    aad: &aad,
                },
            )
            .map_err(|err| {
                tracing::error!("cannot seal token: {err}");
                TokenError::Invalid
            })?;

        let mut body = nonce.to_vec();
        body.extend_from_slice(&ciphertext);
        Ok((format!("{HEADER}{}", URL_SAFE_NO_PAD.encode(body)), payload))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let encoded = token.strip_prefix(HEADER).ok_or(TokenError::Invalid)?;
        // No footer is ever issued.
        if encoded.contains('.') {
            return Err(TokenError::Invalid);
        }
        let body = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Invalid)?;
        if body.len() < NONCE_SIZE + TAG_SIZE {
            return Err(TokenError::Invalid);
        }

        let (nonce, ciphertext) = body.split_at(NONCE_SIZE);
        let aad = pae(&[HEADER.as_bytes(), nonce, b""]);
        let message = self
            .cipher
            .decrypt(
                XNonce::from_slice(nonce),
                Sealed {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| TokenError::Invalid)?;

        let payload: Payload = serde_json::from_slice(&message).map_err(|_| TokenError::Invalid)?;
        payload.valid()?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn created_token_verifies() {
        let maker = PasetoMaker::new(KEY).unwrap();

        let (token, payload) = maker.create_token("alice", Duration::minutes(1)).unwrap();

        assert!(token.starts_with("v2.local."));
        assert_eq!(maker.verify_token(&token).unwrap(), payload);
    }

    #[test]
    fn expired_token_is_rejected() {
        let maker = PasetoMaker::new(KEY).unwrap();

        let (token, _) = maker.create_token("alice", Duration::minutes(-1)).unwrap();

        assert_eq!(maker.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_or_foreign_token_is_rejected() {
        let maker = PasetoMaker::new(KEY).unwrap();
        let (token, _) = maker.create_token("alice", Duration::minutes(1)).unwrap();

        let mut body = URL_SAFE_NO_PAD
            .decode(token.strip_prefix(HEADER).unwrap())
            .unwrap();
        let last = body.len() - 1;
        body[last] ^= 0x01;
        let tampered = format!("{HEADER}{}", URL_SAFE_NO_PAD.encode(&body));
        assert_eq!(maker.verify_token(&tampered), Err(TokenError::Invalid));

        let relabelled = token.replacen("v2.local.", "v2.public.", 1);
        assert_eq!(maker.verify_token(&relabelled), Err(TokenError::Invalid));

        let other = PasetoMaker::new("fedcba9876543210fedcba9876543210").unwrap();
        assert_eq!(other.verify_token(&token), Err(TokenError::Invalid));

        assert_eq!(maker.verify_token("v2.local.AAAA"), Err(TokenError::Invalid));
    }

    #[test]
    fn key_must_be_exactly_32_bytes() {
        assert!(matches!(
            PasetoMaker::new("short"),
            Err(TokenError::InvalidKeySize(_))
        ));
        assert!(matches!(
            PasetoMaker::new(&format!("{KEY}x")),
            Err(TokenError::InvalidKeySize(_))
        ));
    }

    #[test]
    fn pae_prefixes_count_and_lengths() {
        let encoded = pae(&[b"ab", b""]);
        assert_eq!(
            encoded,
            [
                &2u64.to_le_bytes()[..],
                &2u64.to_le_bytes()[..],
                &b"ab"[..],
                &0u64.to_le_bytes()[..],
            ]
            .concat()
        );
    }
}
