//! Authenticated encryption of strings with a Keyward [`Key`].
//! Uses AES-256-GCM; tokens are self-contained and URL-safe.

use std::fmt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use keyward_core::key::Key;
use thiserror::Error;
use tracing::instrument;

const TOKEN_VERSION: u8 = 0x01;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Wrong key, tampered token or malformed token. Deliberately carries no detail.
    #[error("token failed authentication")]
    AuthenticationFailed,
    #[error("encryption failed")]
    Encryption,
    /// Token authenticated but its payload is not UTF-8 text.
    #[error("decrypted payload is not valid UTF-8")]
    InvalidPlaintext,
}

/// Opaque encrypted token: `base64url(version || nonce || ciphertext || tag)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// Surrounding whitespace (e.g. a pasted trailing newline) is dropped by every conversion.
impl From<String> for Token {
    fn from(value: String) -> Self {
        if value.trim().len() == value.len() {
            Self(value)
        } else {
            Self::from(value.as_str())
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
#[instrument(skip_all, fields(len = plaintext.len()))]
pub fn encrypt(plaintext: &str, key: &Key) -> Result<Token, CipherError> {
    let cipher = build_cipher(key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let aad = [TOKEN_VERSION];
    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: &aad,
            },
        )
        .map_err(|_| CipherError::Encryption)?;

    let mut raw = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    raw.push(TOKEN_VERSION);
    raw.extend_from_slice(nonce.as_slice());
    raw.extend_from_slice(&ciphertext);
    Ok(Token(URL_SAFE.encode(raw)))
}

/// Decrypt a token produced by [`encrypt`].
///
/// Any failure before the payload is recovered (bad encoding, truncation, unknown
/// version, wrong key, tampering) maps to [`CipherError::AuthenticationFailed`].
#[instrument(skip_all)]
pub fn decrypt(token: &Token, key: &Key) -> Result<String, CipherError> {
    let raw = URL_SAFE
        .decode(token.as_str())
        .map_err(|_| CipherError::AuthenticationFailed)?;

    if raw.len() < HEADER_LEN + TAG_LEN || raw[0] != TOKEN_VERSION {
        return Err(CipherError::AuthenticationFailed);
    }

    let nonce = Nonce::from_slice(&raw[1..HEADER_LEN]);
    let plaintext = build_cipher(key)
        .decrypt(
            nonce,
            Payload {
                msg: &raw[HEADER_LEN..],
                aad: &raw[..1],
            },
        )
        .map_err(|_| CipherError::AuthenticationFailed)?;

    String::from_utf8(plaintext).map_err(|_| CipherError::InvalidPlaintext)
}

fn build_cipher(key: &Key) -> Aes256Gcm {
    Aes256Gcm::new(key.as_bytes().into())
}
