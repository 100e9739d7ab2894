//! Secure content codec for password-protected notes and vault items.
//!
//! # Responsibility
//! - Turn a UTF-8 plaintext and a password into an opaque text envelope,
//!   and back.
//! - Seal vault item content under an already derived session key.
//!
//! # Invariants
//! - Decryption either returns the exact original plaintext or
//!   `CodecError::AuthenticationFailed`; never partial or garbled text.
//! - Wrong password and malformed input are reported identically and
//!   cost one key derivation each. The costs match only when the
//!   envelope was written with this codec's parameters; a malformed input
//!   is charged at `self.params`, a well-formed one at its recorded ones.
//! - `encrypt` refuses parameters that `decrypt` would reject, so every
//!   envelope it returns can be opened again.
//! - Every encryption uses a fresh random salt and nonce.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod envelope;
pub mod kdf;

use envelope::{
    from_text, key_header, parse_key_envelope, parse_password_envelope, password_header, to_text,
    NONCE_LEN,
};
pub use kdf::{derive_key, generate_salt, hash_password, verify_password, KdfParams, KEY_LEN};
use kdf::{random_array, SALT_LEN};

/// Codec failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Wrong password, or input not produced by this codec.
    AuthenticationFailed,
    /// Key derivation rejected its parameters.
    KeyDerivation(String),
    /// AEAD refused to encrypt (oversized input).
    Encryption,
    /// Stored password hash could not be parsed.
    InvalidPasswordHash(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed => write!(f, "incorrect password or corrupted content"),
            Self::KeyDerivation(details) => write!(f, "key derivation failed: {details}"),
            Self::Encryption => write!(f, "encryption failed"),
            Self::InvalidPasswordHash(details) => write!(f, "invalid password hash: {details}"),
        }
    }
}

impl Error for CodecError {}

/// Password-based content codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureContentCodec {
    params: KdfParams,
}

impl SecureContentCodec {
    /// Creates a codec that encrypts with `params`.
    ///
    /// Decryption always uses the parameters recorded in the envelope.
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Encrypts `plaintext` under `password`.
    ///
    /// `plaintext` may be empty. A non-empty `password` is the caller's
    /// responsibility. Two calls with identical inputs yield different
    /// envelopes.
    ///
    /// # Errors
    /// `KeyDerivation` when the codec's parameters exceed the ceilings
    /// enforced on decryption.
    pub fn encrypt(&self, plaintext: &str, password: &str) -> Result<String, CodecError> {
        if !self.params.is_within_limits() {
            return Err(CodecError::KeyDerivation(format!(
                "kdf parameters out of range: {:?}",
                self.params
            )));
        }
        let salt: [u8; SALT_LEN] = random_array();
        let nonce: [u8; NONCE_LEN] = random_array();
        let key = derive_key(password.as_bytes(), &salt, &self.params)?;

        let mut envelope = password_header(&self.params, &salt, &nonce);
        let body = seal(&key, &nonce, &envelope, plaintext.as_bytes())?;
        envelope.extend_from_slice(&body);
        Ok(to_text(&envelope))
    }

    /// Decrypts an envelope produced by `encrypt`.
    ///
    /// An empty `Ok("")` means the plaintext really was empty.
    pub fn decrypt(&self, ciphertext: &str, password: &str) -> Result<String, CodecError> {
        let result = match from_text(ciphertext) {
            Some(bytes) => match parse_password_envelope(&bytes) {
                Some(envelope) => {
                    derive_key(password.as_bytes(), &envelope.salt, &envelope.params)
                        .map_err(|_| CodecError::AuthenticationFailed)
                        .and_then(|key| open(&key, &envelope.nonce, envelope.header, envelope.body))
                }
                None => self.reject_malformed(password),
            },
            None => self.reject_malformed(password),
        };

        // Same line for every failure cause.
        if result.is_err() {
            debug!("event=content_decrypt module=codec status=auth_failed");
        }
        result
    }

    /// Seals `plaintext` under an already derived key.
    pub fn seal_with_key(key: &[u8; KEY_LEN], plaintext: &str) -> Result<String, CodecError> {
        let nonce: [u8; NONCE_LEN] = random_array();
        let mut envelope = key_header(&nonce);
        let body = seal(key, &nonce, &envelope, plaintext.as_bytes())?;
        envelope.extend_from_slice(&body);
        Ok(to_text(&envelope))
    }

    /// Opens a key envelope produced by `seal_with_key`.
    pub fn open_with_key(key: &[u8; KEY_LEN], sealed: &str) -> Result<String, CodecError> {
        let bytes = from_text(sealed).ok_or(CodecError::AuthenticationFailed)?;
        let envelope = parse_key_envelope(&bytes).ok_or(CodecError::AuthenticationFailed)?;
        open(key, &envelope.nonce, envelope.header, envelope.body)
    }

    fn reject_malformed(&self, password: &str) -> Result<String, CodecError> {
        let _ = derive_key(password.as_bytes(), &[0u8; SALT_LEN], &self.params);
        Err(CodecError::AuthenticationFailed)
    }
}

fn seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    cipher
        .encrypt(
            XNonce::from_slice(nonce.as_slice()),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CodecError::Encryption)
}

fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    body: &[u8],
) -> Result<String, CodecError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce.as_slice()), Payload { msg: body, aad })
        .map_err(|_| CodecError::AuthenticationFailed)?;
    String::from_utf8(plaintext).map_err(|_| CodecError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::{CodecError, KdfParams, SecureContentCodec};
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn codec() -> SecureContentCodec {
        SecureContentCodec::new(KdfParams::new(64, 1, 1))
    }

    #[test]
    fn tampered_header_fails_authentication() {
        let codec = codec();
        let sealed = codec.encrypt("body", "pw").unwrap();
        let mut bytes = STANDARD.decode(&sealed).unwrap();
        // Flip one salt byte.
        bytes[20] ^= 0x01;
        let tampered = STANDARD.encode(&bytes);
        assert_eq!(
            codec.decrypt(&tampered, "pw").unwrap_err(),
            CodecError::AuthenticationFailed
        );
    }

    #[test]
    fn key_envelope_rejects_other_key_and_password_envelope() {
        let key = [3u8; 32];
        let sealed = SecureContentCodec::seal_with_key(&key, "vault body").unwrap();
        assert_eq!(
            SecureContentCodec::open_with_key(&key, &sealed).unwrap(),
            "vault body"
        );
        assert!(SecureContentCodec::open_with_key(&[4u8; 32], &sealed).is_err());

        let password_envelope = codec().encrypt("x", "pw").unwrap();
        assert!(SecureContentCodec::open_with_key(&key, &password_envelope).is_err());
    }

    #[test]
    fn envelope_records_encryption_params() {
        let strong = SecureContentCodec::new(KdfParams::new(128, 2, 1));
        let sealed = strong.encrypt("hello", "pw").unwrap();
        // A codec with other defaults still decrypts.
        assert_eq!(codec().decrypt(&sealed, "pw").unwrap(), "hello");
    }

    #[test]
    fn foreign_params_and_garbage_fail_with_the_same_error() {
        let sealed = SecureContentCodec::new(KdfParams::new(128, 2, 1))
            .encrypt("hello", "pw")
            .unwrap();
        let local = codec();
        assert_eq!(
            local.decrypt(&sealed, "wrong"),
            Err(CodecError::AuthenticationFailed)
        );
        assert_eq!(
            local.decrypt("not an envelope", "wrong"),
            Err(CodecError::AuthenticationFailed)
        );
    }
}
