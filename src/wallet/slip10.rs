//! SLIP-0010 hierarchical key derivation for the Ed25519 curve.
//!
//! Ed25519 only supports hardened derivation, so every component of a
//! path must carry the hardened marker. Only the terminal node's private
//! key is ever used; intermediate nodes stay on the stack and are wiped
//! when dropped.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::{WalletError, WalletResult};

type HmacSha512 = Hmac<Sha512>;

const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A single node in the derivation tree.
pub struct Node {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl Node {
    /// Master node from a BIP-39 seed.
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = hmac_sha512(MASTER_HMAC_KEY, &[seed]);
        Self::split(&digest)
    }

    /// Walk a full path like `m/44'/314159'/0'` from a seed.
    pub fn derive_path(seed: &[u8], path: &str) -> WalletResult<Self> {
        let components = parse_path(path)?;
        let mut node = Self::from_seed(seed);
        for index in components {
            node = node.derive_child(index)?;
        }
        Ok(node)
    }

    /// Derive a hardened child. `index` must already include the
    /// hardened offset; anything below it is rejected.
    pub fn derive_child(&self, index: u32) -> WalletResult<Self> {
        if index < HARDENED_OFFSET {
            return Err(WalletError::derivation(
                "ed25519 derivation only supports hardened child indexes",
            ));
        }
        let digest = hmac_sha512(
            &self.chain_code,
            &[&[0u8], self.key.as_slice(), &index.to_be_bytes()],
        );
        Ok(Self::split(&digest))
    }

    /// The node's 32-byte private scalar.
    pub fn private_key(&self) -> &[u8; 32] {
        &self.key
    }

    #[cfg(test)]
    fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    fn split(digest: &[u8; 64]) -> Self {
        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&digest[..32]);
        chain_code.copy_from_slice(&digest[32..]);
        Self { key, chain_code }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.key.zeroize();
        self.chain_code.zeroize();
    }
}

/// Parse a `m/44'/314159'/0'` style path into hardened child indexes.
fn parse_path(path: &str) -> WalletResult<Vec<u32>> {
    let mut parts = path.split('/');
    if parts.next() != Some("m") {
        return Err(WalletError::derivation(format!(
            "derivation path must start with 'm': {path}"
        )));
    }
    let mut components = Vec::new();
    for part in parts {
        let hardened = part.ends_with('\'') || part.ends_with('h') || part.ends_with('H');
        if !hardened {
            return Err(WalletError::derivation(format!(
                "non-hardened path component '{part}' is not valid for ed25519"
            )));
        }
        let index: u32 = part[..part.len() - 1].parse().map_err(|_| {
            WalletError::derivation(format!("invalid path component '{part}'"))
        })?;
        if index >= HARDENED_OFFSET {
            return Err(WalletError::derivation(format!(
                "path component '{part}' out of range"
            )));
        }
        components.push(index | HARDENED_OFFSET);
    }
    if components.is_empty() {
        return Err(WalletError::derivation(format!(
            "derivation path has no components: {path}"
        )));
    }
    Ok(components)
}

fn hmac_sha512(key: &[u8], chunks: &[&[u8]]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    for chunk in chunks {
        mac.update(chunk);
    }
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}
