use anyhow::{anyhow, Result};
use base64::prelude::*;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// How long a consent round-trip may take
pub const STATE_MAX_AGE_SECS: i64 = 600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid state format")]
    Malformed,
    #[error("state signature verification failed")]
    BadSignature,
    #[error("state has expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatePayload {
    issued_at: i64,
    nonce: String,
}

/// Signs and verifies the OAuth `state` parameter
#[derive(Clone)]
pub struct StateSigner {
    key: Vec<u8>,
}

impl StateSigner {
    /// Uses `secret` as the HMAC key, or a random one (states then won't survive restarts)
    pub fn new(secret: Option<&str>) -> Self {
        let key = match secret {
            Some(s) => s.as_bytes().to_vec(),
            None => rand::random::<[u8; 32]>().to_vec(),
        };
        Self { key }
    }

    /// Issues a state token stamped with `now` (Unix seconds)
    pub fn issue(&self, now: i64) -> Result<String> {
        let payload = StatePayload {
            issued_at: now,
            nonce: BASE64_URL_SAFE_NO_PAD.encode(rand::random::<[u8; 16]>()),
        };
        let json = serde_json::to_string(&payload)?;
        let encoded = BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes());

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| anyhow!("Failed to create HMAC: {}", e))?;
        mac.update(encoded.as_bytes());
        let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", encoded, signature))
    }

    /// Checks signature and age of a state token
    pub fn verify(&self, state: &str, now: i64) -> Result<(), StateError> {
        let (encoded, signature_b64) = state.split_once('.').ok_or(StateError::Malformed)?;
        if signature_b64.contains('.') {
            return Err(StateError::Malformed);
        }

        let provided = BASE64_URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| StateError::Malformed)?;

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|_| StateError::BadSignature)?;
        mac.update(encoded.as_bytes());
        let expected = mac.finalize().into_bytes();

        if !bool::from(expected.as_slice().ct_eq(&provided[..])) {
            return Err(StateError::BadSignature);
        }

        let json = BASE64_URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| StateError::Malformed)?;
        let payload: StatePayload =
            serde_json::from_slice(&json).map_err(|_| StateError::Malformed)?;

        let age = now - payload.issued_at;
        if !(0..=STATE_MAX_AGE_SECS).contains(&age) {
            return Err(StateError::Expired);
        }

        Ok(())
    }
}
