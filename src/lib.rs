//! Non-custodial wallet core for the Pi ledger.
//!
//! Three layers, composed bottom-up: deterministic key derivation from
//! a BIP-39 recovery phrase ([`wallet`]), PIN-encrypted at-rest storage
//! with session handling ([`vault`]), and a Horizon client for account
//! state, payment history, and signed transaction submission
//! ([`ledger`]). The vault never talks to the network and the ledger
//! client never sees the PIN.

pub mod error;
pub mod ledger;
pub mod vault;
pub mod wallet;

pub use error::{WalletError, WalletResult};
pub use ledger::{AccountState, LedgerClient, Network, PaymentDetail, PaymentPage, PaymentRecord};
pub use vault::{SecretPayload, Vault};
pub use wallet::{keygen::MnemonicLength, KeyPair, Wallet};
