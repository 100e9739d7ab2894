//! Binary layout of codec envelopes.
//!
//! Password envelope (`0x01`):
//! `version | memory_kib u32le | iterations u32le | parallelism u32le |
//! salt[16] | nonce[24] | ciphertext+tag`
//!
//! Key envelope (`0x02`): `version | nonce[24] | ciphertext+tag`
//!
//! Everything before the ciphertext is the header and is authenticated as
//! AEAD associated data. Envelopes travel as standard base64 text.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::kdf::{KdfParams, SALT_LEN};

pub(crate) const PASSWORD_ENVELOPE_VERSION: u8 = 0x01;
pub(crate) const KEY_ENVELOPE_VERSION: u8 = 0x02;
pub(crate) const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;
const PASSWORD_HEADER_LEN: usize = 1 + 3 * 4 + SALT_LEN + NONCE_LEN;
const KEY_HEADER_LEN: usize = 1 + NONCE_LEN;

pub(crate) struct PasswordEnvelope<'a> {
    pub params: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub header: &'a [u8],
    pub body: &'a [u8],
}

pub(crate) struct KeyEnvelope<'a> {
    pub nonce: [u8; NONCE_LEN],
    pub header: &'a [u8],
    pub body: &'a [u8],
}

pub(crate) fn password_header(
    params: &KdfParams,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Vec<u8> {
    let mut header = Vec::with_capacity(PASSWORD_HEADER_LEN);
    header.push(PASSWORD_ENVELOPE_VERSION);
    header.extend_from_slice(&params.memory_kib.to_le_bytes());
    header.extend_from_slice(&params.iterations.to_le_bytes());
    header.extend_from_slice(&params.parallelism.to_le_bytes());
    header.extend_from_slice(salt);
    header.extend_from_slice(nonce);
    header
}

pub(crate) fn key_header(nonce: &[u8; NONCE_LEN]) -> Vec<u8> {
    let mut header = Vec::with_capacity(KEY_HEADER_LEN);
    header.push(KEY_ENVELOPE_VERSION);
    header.extend_from_slice(nonce);
    header
}

/// Splits a password envelope. `None` for anything this codec did not write.
pub(crate) fn parse_password_envelope(bytes: &[u8]) -> Option<PasswordEnvelope<'_>> {
    if bytes.len() < PASSWORD_HEADER_LEN + TAG_LEN || bytes[0] != PASSWORD_ENVELOPE_VERSION {
        return None;
    }
    let (header, body) = bytes.split_at(PASSWORD_HEADER_LEN);
    let params = KdfParams::new(read_u32(header, 1)?, read_u32(header, 5)?, read_u32(header, 9)?);
    if !params.is_within_limits() {
        return None;
    }
    let salt = header[13..13 + SALT_LEN].try_into().ok()?;
    let nonce = header[13 + SALT_LEN..].try_into().ok()?;
    Some(PasswordEnvelope {
        params,
        salt,
        nonce,
        header,
        body,
    })
}

pub(crate) fn parse_key_envelope(bytes: &[u8]) -> Option<KeyEnvelope<'_>> {
    if bytes.len() < KEY_HEADER_LEN + TAG_LEN || bytes[0] != KEY_ENVELOPE_VERSION {
        return None;
    }
    let (header, body) = bytes.split_at(KEY_HEADER_LEN);
    let nonce = header[1..].try_into().ok()?;
    Some(KeyEnvelope {
        nonce,
        header,
        body,
    })
}

pub(crate) fn to_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn from_text(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text.trim()).ok()
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::{parse_key_envelope, parse_password_envelope, password_header, KdfParams};

    #[test]
    fn header_fields_survive_parsing() {
        let params = KdfParams::new(64, 1, 1);
        let mut bytes = password_header(&params, &[1u8; 16], &[2u8; 24]);
        bytes.extend_from_slice(&[0u8; 16]);

        let parsed = parse_password_envelope(&bytes).expect("well-formed envelope");
        assert_eq!(parsed.params, params);
        assert_eq!(parsed.salt, [1u8; 16]);
        assert_eq!(parsed.nonce, [2u8; 24]);
        assert_eq!(parsed.body.len(), 16);
    }

    #[test]
    fn truncated_or_foreign_bytes_are_rejected() {
        assert!(parse_password_envelope(&[]).is_none());
        assert!(parse_password_envelope(&[0x01; 20]).is_none());
        assert!(parse_password_envelope(&[0x09; 128]).is_none());
        assert!(parse_key_envelope(&[0x02; 10]).is_none());
    }

    #[test]
    fn absurd_cost_parameters_are_rejected() {
        let mut bytes = password_header(&KdfParams::new(u32::MAX, 1, 1), &[0u8; 16], &[0u8; 24]);
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(parse_password_envelope(&bytes).is_none());
    }
}
