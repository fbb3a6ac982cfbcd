//! Mnemonic generation, validation, and deterministic key derivation.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroize;

use super::{slip10, KeyPair};
use crate::error::{WalletError, WalletResult};

/// BIP-44 account path: purpose 44', coin type 314159' (Pi), account 0'.
/// Every component is hardened, as ed25519 derivation requires.
pub const ACCOUNT_PATH: &str = "m/44'/314159'/0'";

/// Supported recovery phrase sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicLength {
    /// 12 words, 128 bits of entropy.
    Words12,
    /// 24 words, 256 bits of entropy.
    Words24,
}

impl MnemonicLength {
    fn entropy_bytes(self) -> usize {
        match self {
            Self::Words12 => 16,
            Self::Words24 => 32,
        }
    }

    pub fn word_count(self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words24 => 24,
        }
    }
}

/// Generate a new BIP-39 mnemonic using OS entropy.
pub fn generate_mnemonic(length: MnemonicLength) -> WalletResult<String> {
    let mut entropy = vec![0u8; length.entropy_bytes()];
    rand::thread_rng().fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::derivation(format!("mnemonic generation failed: {e}")))?;
    entropy.zeroize();
    Ok(mnemonic.to_string())
}

/// Validate a BIP-39 mnemonic checksum. Pure; never touches key material.
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_in(Language::English, mnemonic).is_ok()
}

/// Derive the wallet keypair from a mnemonic.
///
/// Stretches the phrase into a 64-byte seed (empty BIP-39 passphrase),
/// walks [`ACCOUNT_PATH`], and maps the terminal private scalar onto
/// Ed25519. Deterministic: the same phrase always yields the same
/// keypair. Validation failure short-circuits before any key material
/// is computed.
pub fn derive_keypair(mnemonic: &str) -> WalletResult<KeyPair> {
    let parsed = Mnemonic::parse_in(Language::English, mnemonic)
        .map_err(|_| WalletError::InvalidMnemonic)?;
    let mut seed = parsed.to_seed("");
    let node = slip10::Node::derive_path(&seed, ACCOUNT_PATH)?;
    seed.zeroize();
    Ok(KeyPair::from_seed_bytes(*node.private_key()))
}
