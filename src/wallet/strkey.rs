//! Strkey encoding for Ed25519 account identifiers and secret seeds.
//!
//! The ledger identifies accounts by a 56-character base32 string: a
//! version byte, the raw 32-byte key, and a CRC16-XModem checksum in
//! little-endian order. Public keys carry the `G` version byte, secret
//! seeds the `S` version byte.

use base32::Alphabet;

use crate::error::{WalletError, WalletResult};

/// Version byte for public account identifiers (encodes to a leading 'G').
const VERSION_ACCOUNT_ID: u8 = 6 << 3;
/// Version byte for secret seeds (encodes to a leading 'S').
const VERSION_SEED: u8 = 18 << 3;

const STRKEY_LEN: usize = 56;
const ALPHABET: Alphabet = Alphabet::Rfc4648 { padding: false };

/// Encode a raw Ed25519 public key as a `G...` account identifier.
pub fn encode_account_id(key: &[u8; 32]) -> String {
    encode(VERSION_ACCOUNT_ID, key)
}

/// Encode a raw Ed25519 private scalar as an `S...` secret seed.
pub fn encode_seed(key: &[u8; 32]) -> String {
    encode(VERSION_SEED, key)
}

/// Decode and validate a `G...` account identifier.
pub fn decode_account_id(input: &str) -> WalletResult<[u8; 32]> {
    decode(VERSION_ACCOUNT_ID, input)
        .ok_or_else(|| WalletError::InvalidAddress(input.to_string()))
}

/// Decode and validate an `S...` secret seed.
pub fn decode_seed(input: &str) -> WalletResult<[u8; 32]> {
    decode(VERSION_SEED, input)
        .ok_or_else(|| WalletError::derivation("malformed secret seed encoding"))
}

/// Check whether a string is a well-formed account identifier.
pub fn is_valid_account_id(input: &str) -> bool {
    decode(VERSION_ACCOUNT_ID, input).is_some()
}

fn encode(version: u8, payload: &[u8; 32]) -> String {
    let mut data = Vec::with_capacity(35);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = crc16_xmodem(&data);
    data.extend_from_slice(&checksum.to_le_bytes());
    base32::encode(ALPHABET, &data)
}

fn decode(version: u8, input: &str) -> Option<[u8; 32]> {
    if input.len() != STRKEY_LEN {
        return None;
    }
    let data = base32::decode(ALPHABET, input)?;
    if data.len() != 35 {
        return None;
    }
    let (body, checksum) = data.split_at(33);
    if body[0] != version {
        return None;
    }
    if crc16_xmodem(body) != u16::from_le_bytes([checksum[0], checksum[1]]) {
        return None;
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&body[1..]);
    Some(key)
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_round_trip() {
        let key = [7u8; 32];
        let encoded = encode_account_id(&key);
        assert_eq!(encoded.len(), 56);
        assert!(encoded.starts_with('G'));
        assert_eq!(decode_account_id(&encoded).unwrap(), key);
    }

    #[test]
    fn seed_round_trip() {
        let key = [42u8; 32];
        let encoded = encode_seed(&key);
        assert_eq!(encoded.len(), 56);
        assert!(encoded.starts_with('S'));
        assert_eq!(decode_seed(&encoded).unwrap(), key);
    }

    #[test]
    fn tampered_character_rejected() {
        let encoded = encode_account_id(&[7u8; 32]);
        // Flip one character in the key body.
        let mut chars: Vec<char> = encoded.chars().collect();
        chars[10] = if chars[10] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_account_id(&tampered).is_err());
    }

    #[test]
    fn seed_is_not_a_valid_account_id() {
        let encoded = encode_seed(&[9u8; 32]);
        assert!(decode_account_id(&encoded).is_err());
        assert!(!is_valid_account_id(&encoded));
    }

    #[test]
    fn malformed_inputs_rejected() {
        assert!(!is_valid_account_id(""));
        assert!(!is_valid_account_id("G"));
        assert!(!is_valid_account_id(&"G".repeat(56)));
        assert!(!is_valid_account_id("not an address at all"));
    }
}
