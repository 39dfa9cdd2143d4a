//! Guarded string attribute values
//!
//! Secrets (passwords, API keys) travel through the record model encrypted
//! with AES-256-GCM under a per-process key. The clear text is only ever
//! exposed inside [`GuardedString::access`] and is zeroized afterwards.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{ConnectorError, ConnectorResult};

/// Length of AES-256 key in bytes.
const KEY_LENGTH: usize = 32;

/// Length of GCM nonce in bytes.
const NONCE_LENGTH: usize = 12;

/// Length of GCM authentication tag in bytes.
const TAG_LENGTH: usize = 16;

static PROCESS_KEY: OnceLock<[u8; KEY_LENGTH]> = OnceLock::new();

fn process_key() -> &'static [u8; KEY_LENGTH] {
    PROCESS_KEY.get_or_init(|| {
        let mut key = [0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut key);
        key
    })
}

/// An encrypted string value.
///
/// Two guarded strings are equal when their clear texts are equal; the
/// comparison uses a SHA-256 digest so neither side is decrypted.
#[derive(Clone)]
pub struct GuardedString {
    /// nonce || ciphertext || tag
    sealed: Vec<u8>,
    digest: [u8; 32],
}

impl GuardedString {
    /// Encrypt the given clear text.
    pub fn new(clear_text: &str) -> ConnectorResult<Self> {
        let cipher = Aes256Gcm::new_from_slice(process_key()).map_err(|e| {
            ConnectorError::EncryptionFailed {
                message: format!("failed to create cipher: {e}"),
            }
        })?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, clear_text.as_bytes())
            .map_err(|e| ConnectorError::EncryptionFailed {
                message: format!("encryption failed: {e}"),
            })?;

        let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(Self {
            sealed,
            digest: Sha256::digest(clear_text.as_bytes()).into(),
        })
    }

    /// Run `f` against the decrypted clear text.
    ///
    /// The decrypted buffer is zeroized before this returns.
    pub fn access<R>(&self, f: impl FnOnce(&str) -> R) -> ConnectorResult<R> {
        if self.sealed.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(ConnectorError::DecryptionFailed {
                message: "ciphertext too short".to_string(),
            });
        }

        let cipher = Aes256Gcm::new_from_slice(process_key()).map_err(|e| {
            ConnectorError::DecryptionFailed {
                message: format!("failed to create cipher: {e}"),
            }
        })?;

        let (nonce_bytes, encrypted) = self.sealed.split_at(NONCE_LENGTH);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
            .map_err(|e| ConnectorError::DecryptionFailed {
                message: format!("decryption failed: {e}"),
            })?;

        let mut clear = String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            ConnectorError::DecryptionFailed {
                message: "decrypted data is not valid UTF-8".to_string(),
            }
        })?;

        let result = f(&clear);
        clear.zeroize();
        Ok(result)
    }

    /// Check a candidate clear text without decrypting.
    pub fn matches(&self, clear_text: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(clear_text.as_bytes()).into();
        candidate == self.digest
    }
}

impl PartialEq for GuardedString {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for GuardedString {}

impl Hash for GuardedString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl std::fmt::Debug for GuardedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
