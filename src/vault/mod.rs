//! Encrypted at-rest storage for wallet secrets.
//!
//! Three named slots live under one directory: the encrypted wallet
//! blob, the unlocked-session token, and the network preference. Only
//! the wallet blob is encrypted; the PIN is stretched with
//! PBKDF2-HMAC-SHA256 and the payload sealed with AES-256-GCM, so a
//! wrong PIN and a corrupted blob both surface as the same
//! authentication failure.

use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{WalletError, WalletResult};
use crate::ledger::Network;

const PBKDF2_ITERATIONS: u32 = 10_000;
const BLOB_VERSION: u32 = 1;

const WALLET_FILE: &str = "wallet.json";
const SESSION_FILE: &str = "session.token";
const NETWORK_FILE: &str = "network";

/// The secrets a wallet persists: the recovery phrase plus the derived
/// keys it re-creates on every unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretPayload {
    pub mnemonic: String,
    pub public_key: String,
    pub secret_key: String,
}

/// At-rest representation of the wallet slot. All byte fields are
/// base64. `salt` feeds PBKDF2 and `nonce` feeds AES-GCM; they are
/// distinct fields and each is freshly drawn on every store.
#[derive(Serialize, Deserialize)]
struct EncryptedBlob {
    version: u32,
    data: String,
    salt: String,
    nonce: String,
}

/// File-backed vault holding the three wallet storage slots.
pub struct Vault {
    dir: PathBuf,
}

impl Vault {
    /// Open the vault at the platform config directory.
    pub fn open() -> WalletResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| {
                WalletError::Storage(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine config directory",
                ))
            })?
            .join("piwallet");
        Self::open_at(dir)
    }

    /// Open the vault rooted at an explicit directory.
    pub fn open_at(dir: impl Into<PathBuf>) -> WalletResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Encrypt `payload` under `pin` and replace the wallet slot.
    ///
    /// A fresh 16-byte salt and 12-byte nonce are drawn per store, so
    /// storing the same payload twice never produces equal blobs. The
    /// slot is swapped in with a rename, so readers observe either the
    /// old blob or the new one, never a partial write.
    pub fn store(&self, payload: &SecretPayload, pin: &str) -> WalletResult<()> {
        if pin.is_empty() {
            return Err(WalletError::InvalidPin);
        }

        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let mut key = derive_key(pin, &salt);
        let cipher = Aes256Gcm::new(&key.into());
        key.zeroize();

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut plaintext = serde_json::to_vec(payload)?;
        let ciphertext = cipher.encrypt(&nonce, plaintext.as_slice()).map_err(|_| {
            WalletError::Storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "wallet encryption failed",
            ))
        })?;
        plaintext.zeroize();

        let blob = EncryptedBlob {
            version: BLOB_VERSION,
            data: BASE64.encode(&ciphertext),
            salt: BASE64.encode(salt),
            nonce: BASE64.encode(nonce),
        };
        self.replace_slot(WALLET_FILE, &serde_json::to_string_pretty(&blob)?)?;
        debug!("wallet blob stored");
        Ok(())
    }

    /// Decrypt the wallet slot with `pin`.
    ///
    /// A missing blob is [`WalletError::NoWalletStored`]; every
    /// decryption, decoding, or deserialization failure collapses into
    /// [`WalletError::WrongPinOrCorrupt`]; the vault offers no oracle
    /// for which one it was.
    pub fn load(&self, pin: &str) -> WalletResult<SecretPayload> {
        if pin.is_empty() {
            return Err(WalletError::InvalidPin);
        }
        let path = self.dir.join(WALLET_FILE);
        if !path.exists() {
            return Err(WalletError::NoWalletStored);
        }
        let raw = fs::read_to_string(&path)?;
        let blob: EncryptedBlob =
            serde_json::from_str(&raw).map_err(|_| WalletError::WrongPinOrCorrupt)?;
        if blob.version != BLOB_VERSION {
            return Err(WalletError::WrongPinOrCorrupt);
        }

        let salt = BASE64
            .decode(&blob.salt)
            .map_err(|_| WalletError::WrongPinOrCorrupt)?;
        let nonce_bytes = BASE64
            .decode(&blob.nonce)
            .map_err(|_| WalletError::WrongPinOrCorrupt)?;
        let ciphertext = BASE64
            .decode(&blob.data)
            .map_err(|_| WalletError::WrongPinOrCorrupt)?;
        if nonce_bytes.len() != 12 {
            return Err(WalletError::WrongPinOrCorrupt);
        }

        let mut key = derive_key(pin, &salt);
        let cipher = Aes256Gcm::new(&key.into());
        key.zeroize();

        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|_| WalletError::WrongPinOrCorrupt)?;
        let payload = serde_json::from_slice(&plaintext);
        plaintext.zeroize();
        debug!("wallet blob decrypted");
        payload.map_err(|_| WalletError::WrongPinOrCorrupt)
    }

    /// Whether a wallet blob exists. Never attempts decryption.
    pub fn has_wallet(&self) -> bool {
        self.dir.join(WALLET_FILE).exists()
    }

    /// Irreversibly delete the wallet blob. Idempotent; confirmation is
    /// the caller's concern.
    pub fn clear_wallet(&self) -> WalletResult<()> {
        remove_if_present(&self.dir.join(WALLET_FILE))?;
        debug!("wallet blob cleared");
        Ok(())
    }

    /// Create a fresh unlocked-session token and persist it.
    pub fn create_session(&self) -> WalletResult<String> {
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);
        let token = BASE64.encode(token_bytes);
        self.replace_slot(SESSION_FILE, &token)?;
        Ok(token)
    }

    /// Whether `token` matches the stored session token. Presence of a
    /// valid token means "recently unlocked", nothing stronger.
    pub fn validate_session(&self, token: &str) -> bool {
        match fs::read_to_string(self.dir.join(SESSION_FILE)) {
            Ok(stored) => !token.is_empty() && stored == token,
            Err(_) => false,
        }
    }

    /// Drop the session token. Idempotent.
    pub fn clear_session(&self) -> WalletResult<()> {
        remove_if_present(&self.dir.join(SESSION_FILE))
    }

    /// Persist the network preference. Stored in the clear.
    pub fn set_network_preference(&self, network: Network) -> WalletResult<()> {
        self.replace_slot(NETWORK_FILE, network.name())
    }

    /// The persisted network preference, defaulting to the test network
    /// when the slot is absent or unreadable.
    pub fn network_preference(&self) -> Network {
        fs::read_to_string(self.dir.join(NETWORK_FILE))
            .ok()
            .and_then(|raw| Network::from_name(raw.trim()))
            .unwrap_or(Network::Testnet)
    }

    /// Directory holding the storage slots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn replace_slot(&self, name: &str, contents: &str) -> WalletResult<()> {
        let tmp = self.dir.join(format!("{name}.tmp"));
        let path = self.dir.join(name);
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn derive_key(pin: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn remove_if_present(path: &Path) -> WalletResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_vault() -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::open_at(tmp.path()).unwrap();
        (tmp, vault)
    }

    fn sample_payload() -> SecretPayload {
        SecretPayload {
            mnemonic: "abandon ability able about above absent absorb abstract absurd abuse access accident".into(),
            public_key: "GSAMPLE".into(),
            secret_key: "SSAMPLE".into(),
        }
    }

    #[test]
    fn store_load_round_trip() {
        let (_tmp, vault) = temp_vault();
        let payload = sample_payload();
        vault.store(&payload, "123456").unwrap();
        let loaded = vault.load("123456").unwrap();
        assert_eq!(loaded, payload);
    }

    #[test]
    fn wrong_pin_is_indistinguishable_from_corruption() {
        let (_tmp, vault) = temp_vault();
        vault.store(&sample_payload(), "123456").unwrap();
        let err = vault.load("654321").unwrap_err();
        assert!(matches!(err, WalletError::WrongPinOrCorrupt));
    }

    #[test]
    fn corrupted_blob_fails_like_wrong_pin() {
        let (_tmp, vault) = temp_vault();
        vault.store(&sample_payload(), "123456").unwrap();
        let path = vault.dir().join(WALLET_FILE);
        let mut raw = fs::read_to_string(&path).unwrap();
        raw = raw.replace(':', ";");
        fs::write(&path, raw).unwrap();
        let err = vault.load("123456").unwrap_err();
        assert!(matches!(err, WalletError::WrongPinOrCorrupt));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let (_tmp, vault) = temp_vault();
        vault.store(&sample_payload(), "123456").unwrap();
        let path = vault.dir().join(WALLET_FILE);
        let mut blob: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let data = blob["data"].as_str().unwrap().to_string();
        let flipped = if data.starts_with('A') { "B" } else { "A" };
        blob["data"] = serde_json::Value::String(format!("{flipped}{}", &data[1..]));
        fs::write(&path, blob.to_string()).unwrap();
        // The JSON is intact, so the failure is the GCM tag rejecting
        // the modified ciphertext with the correct PIN.
        let err = vault.load("123456").unwrap_err();
        assert!(matches!(err, WalletError::WrongPinOrCorrupt));
    }

    #[test]
    fn load_without_wallet_reports_no_wallet() {
        let (_tmp, vault) = temp_vault();
        let err = vault.load("123456").unwrap_err();
        assert!(matches!(err, WalletError::NoWalletStored));
    }

    #[test]
    fn empty_pin_rejected() {
        let (_tmp, vault) = temp_vault();
        assert!(matches!(
            vault.store(&sample_payload(), "").unwrap_err(),
            WalletError::InvalidPin
        ));
        assert!(matches!(
            vault.load("").unwrap_err(),
            WalletError::InvalidPin
        ));
    }

    #[test]
    fn has_wallet_tracks_lifecycle() {
        let (_tmp, vault) = temp_vault();
        assert!(!vault.has_wallet());
        vault.store(&sample_payload(), "1234").unwrap();
        assert!(vault.has_wallet());
        vault.clear_wallet().unwrap();
        assert!(!vault.has_wallet());
        // Clearing again is a no-op.
        vault.clear_wallet().unwrap();
    }

    #[test]
    fn repeated_stores_never_produce_equal_blobs() {
        let (_tmp, vault) = temp_vault();
        let payload = sample_payload();
        vault.store(&payload, "1234").unwrap();
        let first = fs::read_to_string(vault.dir().join(WALLET_FILE)).unwrap();
        vault.store(&payload, "1234").unwrap();
        let second = fs::read_to_string(vault.dir().join(WALLET_FILE)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn session_lifecycle() {
        let (_tmp, vault) = temp_vault();
        assert!(!vault.validate_session("anything"));
        let token = vault.create_session().unwrap();
        assert!(vault.validate_session(&token));
        assert!(!vault.validate_session("forged"));
        vault.clear_session().unwrap();
        assert!(!vault.validate_session(&token));
        // Idempotent: clearing twice neither fails nor resurrects.
        vault.clear_session().unwrap();
        assert!(!vault.validate_session(&token));
    }

    #[test]
    fn network_preference_defaults_to_testnet() {
        let (_tmp, vault) = temp_vault();
        assert_eq!(vault.network_preference(), Network::Testnet);
        vault.set_network_preference(Network::Mainnet).unwrap();
        assert_eq!(vault.network_preference(), Network::Mainnet);
    }
}
