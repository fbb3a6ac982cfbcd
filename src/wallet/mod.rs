pub mod keygen;
pub mod slip10;
pub mod strkey;

use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroize;

use crate::error::WalletResult;

/// Ed25519 keypair bound to the ledger's strkey address format.
///
/// The secret scalar lives inside the `SigningKey`, which wipes itself
/// on drop. The strkey-encoded secret is only materialized on demand.
pub struct KeyPair {
    address: String,
    signing: SigningKey,
}

impl KeyPair {
    /// Build a keypair from a raw 32-byte private scalar.
    pub fn from_seed_bytes(mut seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        seed.zeroize();
        let address = strkey::encode_account_id(&signing.verifying_key().to_bytes());
        Self { address, signing }
    }

    /// Restore a keypair from an `S...` strkey secret seed.
    pub fn from_secret(secret: &str) -> WalletResult<Self> {
        let seed = strkey::decode_seed(secret)?;
        Ok(Self::from_seed_bytes(seed))
    }

    /// The `G...` account identifier.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The `S...` strkey encoding of the private scalar.
    pub fn secret(&self) -> String {
        strkey::encode_seed(&self.signing.to_bytes())
    }

    /// Raw 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// Signature hint: the last four bytes of the public key, attached
    /// to each signature so validators can match it to a signer.
    pub fn signature_hint(&self) -> [u8; 4] {
        let public = self.public_key_bytes();
        [public[28], public[29], public[30], public[31]]
    }

    /// Sign a message, returning the detached 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// In-memory wallet session: the mnemonic and its derived keypair.
///
/// Created once per generate/import/unlock and dropped on lock or
/// logout; the mnemonic is wiped when the wallet goes out of scope.
pub struct Wallet {
    mnemonic: String,
    keypair: KeyPair,
}

impl Wallet {
    /// Generate a fresh wallet from OS entropy.
    pub fn generate(length: keygen::MnemonicLength) -> WalletResult<Self> {
        let mnemonic = keygen::generate_mnemonic(length)?;
        let keypair = keygen::derive_keypair(&mnemonic)?;
        Ok(Self { mnemonic, keypair })
    }

    /// Restore a wallet from an existing recovery phrase.
    pub fn from_mnemonic(mnemonic: &str) -> WalletResult<Self> {
        let keypair = keygen::derive_keypair(mnemonic)?;
        Ok(Self {
            mnemonic: mnemonic.to_string(),
            keypair,
        })
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn address(&self) -> &str {
        self.keypair.address()
    }
}

impl Drop for Wallet {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
    }
}
