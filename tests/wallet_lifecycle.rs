//! End-to-end lifecycle: generate a wallet, protect it with a PIN,
//! and recover the same identity through the vault.

use piwallet::{MnemonicLength, SecretPayload, Vault, Wallet, WalletError};
use tempfile::TempDir;

fn temp_vault() -> (TempDir, Vault) {
    let tmp = TempDir::new().unwrap();
    let vault = Vault::open_at(tmp.path()).unwrap();
    (tmp, vault)
}

#[test]
fn generate_store_unlock_recovers_the_same_identity() {
    let (_tmp, vault) = temp_vault();

    let wallet = Wallet::generate(MnemonicLength::Words24).unwrap();
    let payload = SecretPayload {
        mnemonic: wallet.mnemonic().to_string(),
        public_key: wallet.address().to_string(),
        secret_key: wallet.keypair().secret(),
    };
    vault.store(&payload, "123456").unwrap();

    // Unlock with the right PIN and re-derive: identical identity.
    let loaded = vault.load("123456").unwrap();
    assert_eq!(loaded.mnemonic, wallet.mnemonic());
    let restored = Wallet::from_mnemonic(&loaded.mnemonic).unwrap();
    assert_eq!(restored.address(), wallet.address());
    assert_eq!(restored.keypair().secret(), wallet.keypair().secret());

    // The wrong PIN reveals nothing.
    assert!(matches!(
        vault.load("654321").unwrap_err(),
        WalletError::WrongPinOrCorrupt
    ));
}

#[test]
fn imported_phrase_round_trips_through_the_vault() {
    let (_tmp, vault) = temp_vault();

    let original = Wallet::generate(MnemonicLength::Words12).unwrap();
    let imported = Wallet::from_mnemonic(original.mnemonic()).unwrap();
    assert_eq!(imported.address(), original.address());

    let payload = SecretPayload {
        mnemonic: imported.mnemonic().to_string(),
        public_key: imported.address().to_string(),
        secret_key: imported.keypair().secret(),
    };
    vault.store(&payload, "0000").unwrap();
    assert!(vault.has_wallet());

    let unlocked = vault.load("0000").unwrap();
    assert_eq!(
        Wallet::from_mnemonic(&unlocked.mnemonic).unwrap().address(),
        original.address()
    );
}

#[test]
fn logout_clears_session_and_wallet() {
    let (_tmp, vault) = temp_vault();

    let wallet = Wallet::generate(MnemonicLength::Words24).unwrap();
    let payload = SecretPayload {
        mnemonic: wallet.mnemonic().to_string(),
        public_key: wallet.address().to_string(),
        secret_key: wallet.keypair().secret(),
    };
    vault.store(&payload, "9999").unwrap();
    let token = vault.create_session().unwrap();
    assert!(vault.validate_session(&token));

    vault.clear_session().unwrap();
    vault.clear_wallet().unwrap();
    assert!(!vault.validate_session(&token));
    assert!(!vault.has_wallet());
    assert!(matches!(
        vault.load("9999").unwrap_err(),
        WalletError::NoWalletStored
    ));
}
