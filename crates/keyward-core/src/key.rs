use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length in bytes of a Keyward key (AES-256).
pub const KEY_LEN: usize = 32;

/// Symmetric key used for authenticated encryption.
///
/// The bytes are never mutated after generation or decoding; a key is only cloned,
/// encoded for storage, or handed to the cipher. Every copy is wiped when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    bytes: [u8; KEY_LEN],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyDecodeError {
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("expected {KEY_LEN} bytes, got {0}")]
    Length(usize),
}

impl Key {
    /// Raw key bytes, for handing to the cipher.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Textual form written to key files: URL-safe base64 with padding.
    pub fn encode(&self) -> String {
        URL_SAFE.encode(self.bytes)
    }

    /// Inverse of [`Key::encode`]. Surrounding whitespace (e.g. a trailing newline
    /// added by an editor) is ignored.
    pub fn decode(text: &str) -> Result<Self, KeyDecodeError> {
        let bytes = Zeroizing::new(
            URL_SAFE
                .decode(text.trim())
                .map_err(|e| KeyDecodeError::Base64(e.to_string()))?,
        );

        if bytes.len() != KEY_LEN {
            return Err(KeyDecodeError::Length(bytes.len()));
        }

        let mut key = Self {
            bytes: [0u8; KEY_LEN],
        };
        key.bytes.copy_from_slice(&bytes);
        Ok(key)
    }
}

// Never log key bytes.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Generate a fresh key from the OS random source.
///
/// Panics if the OS cannot supply entropy; there is no safe way to continue without it.
#[tracing::instrument(level = "debug")]
pub fn generate_key() -> Key {
    let mut key = Key {
        bytes: [0u8; KEY_LEN],
    };
    OsRng.fill_bytes(&mut key.bytes);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let first = generate_key();
        let second = generate_key();
        assert_ne!(first, second);
    }

    #[test]
    fn encoding_is_url_safe_and_padded() {
        let encoded = generate_key().encode();
        assert_eq!(encoded.len(), 44);
        assert!(encoded.ends_with('='));
        assert!(!encoded.contains('+') && !encoded.contains('/'));
    }

    #[test]
    fn decode_restores_encoded_key() {
        let key = generate_key();
        let decoded = Key::decode(&key.encode()).expect("decode");
        assert_eq!(decoded, key);
    }

    #[test]
    fn decode_tolerates_trailing_newline() {
        let key = generate_key();
        let decoded = Key::decode(&format!("{}\n", key.encode())).expect("decode");
        assert_eq!(decoded, key);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = Key::decode("abcd").expect_err("should reject wrong length");
        assert_eq!(err, KeyDecodeError::Length(3));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = Key::decode("not base64!").expect_err("should reject garbage");
        assert!(matches!(err, KeyDecodeError::Base64(_)));
    }

    #[test]
    fn zeroize_wipes_key_bytes() {
        let mut key = generate_key();
        assert_ne!(key.as_bytes(), &[0u8; KEY_LEN]);

        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn clones_are_independent_of_wiped_original() {
        let mut key = generate_key();
        let copy = key.clone();
        key.zeroize();

        assert_ne!(copy.as_bytes(), &[0u8; KEY_LEN]);
        assert_eq!(Key::decode(&copy.encode()).expect("decode"), copy);
    }

    #[test]
    fn debug_hides_key_bytes() {
        let key = generate_key();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains(&key.encode()));
        assert_eq!(rendered, "Key(<redacted>)");
    }
}
