//! Sealed magic-link tokens.
//!
//! A token is `base64url(nonce || AES-256-GCM(payload_json))` keyed with
//! SHA-256 of the configured secret. Anyone holding the secret can open a
//! token; nobody else can read or forge one.

use crate::error::{AuthError, Result};
use crate::state::Form;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Contents of a magic link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    /// Address the link was sent to.
    pub email: String,

    /// Form fields submitted with the request.
    #[serde(default)]
    pub form: Form,

    /// When the link was issued.
    pub created_at: DateTime<Utc>,
}

/// Seals and opens [`LinkPayload`]s.
#[derive(Clone)]
pub struct LinkSealer {
    cipher: Arc<Aes256Gcm>,
}

impl std::fmt::Debug for LinkSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSealer").finish_non_exhaustive()
    }
}

impl LinkSealer {
    /// Derive the sealing key from a secret.
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        let digest = Sha256::digest(secret);
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Arc::new(Aes256Gcm::new(key)),
        }
    }

    /// Seal a payload into a URL-safe token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if serialization or encryption fails.
    pub fn seal(&self, payload: &LinkPayload) -> Result<String> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| AuthError::InternalError(format!("Failed to encode link: {e}")))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| AuthError::InternalError(format!("Failed to seal link: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a token produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MagicLinkInvalid`] for anything that is not a
    /// token sealed with this key.
    pub fn open(&self, token: &str) -> Result<LinkPayload> {
        let sealed = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| AuthError::MagicLinkInvalid)?;

        if sealed.len() <= NONCE_LEN {
            return Err(AuthError::MagicLinkInvalid);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AuthError::MagicLinkInvalid)?;

        serde_json::from_slice(&plaintext).map_err(|_| AuthError::MagicLinkInvalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload() -> LinkPayload {
        let mut form = Form::new();
        form.insert("email".to_string(), "alice@example.com".to_string());
        LinkPayload {
            email: "alice@example.com".to_string(),
            form,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sealed_token_opens_with_same_secret() {
        let sealer = LinkSealer::from_secret(b"secret");
        let original = payload();

        let token = sealer.seal(&original).unwrap();
        assert_eq!(sealer.open(&token).unwrap(), original);
    }

    #[test]
    fn test_token_does_not_leak_email() {
        let sealer = LinkSealer::from_secret(b"secret");
        let token = sealer.seal(&payload()).unwrap();
        assert!(!token.contains("alice"));
    }

    #[test]
    fn test_each_seal_uses_fresh_nonce() {
        let sealer = LinkSealer::from_secret(b"secret");
        let p = payload();
        assert_ne!(sealer.seal(&p).unwrap(), sealer.seal(&p).unwrap());
    }

    #[test]
    fn test_other_secret_cannot_open() {
        let token = LinkSealer::from_secret(b"secret").seal(&payload()).unwrap();
        let err = LinkSealer::from_secret(b"other").open(&token).unwrap_err();
        assert_eq!(err, AuthError::MagicLinkInvalid);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let sealer = LinkSealer::from_secret(b"secret");
        let token = sealer.seal(&payload()).unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(bytes);

        assert_eq!(sealer.open(&tampered).unwrap_err(), AuthError::MagicLinkInvalid);
    }

    #[test]
    fn test_garbage_is_invalid() {
        let sealer = LinkSealer::from_secret(b"secret");
        assert_eq!(sealer.open("").unwrap_err(), AuthError::MagicLinkInvalid);
        assert_eq!(sealer.open("!!!").unwrap_err(), AuthError::MagicLinkInvalid);
        assert_eq!(sealer.open("AAAA").unwrap_err(), AuthError::MagicLinkInvalid);
    }
}
