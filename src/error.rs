use thiserror::Error;

/// Wallet-wide error types
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("key derivation failed: {0}")]
    DerivationFailure(String),

    #[error("wrong PIN or corrupted wallet data")]
    WrongPinOrCorrupt,

    #[error("no wallet found in storage")]
    NoWalletStored,

    #[error("PIN must not be empty")]
    InvalidPin,

    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid memo: {0}")]
    InvalidMemo(String),

    #[error("account {0} is not activated")]
    AccountNotActivated(String),

    #[error("insufficient spendable balance: need {required} stroops, have {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("network request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected ledger response: {0}")]
    BadResponse(String),

    #[error("transaction rejected by the ledger: {0}")]
    TransactionRejected(String),

    #[error("submission outcome unknown: {0}")]
    AmbiguousSubmission(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl WalletError {
    pub fn derivation<S: Into<String>>(msg: S) -> Self {
        Self::DerivationFailure(msg.into())
    }

    pub fn bad_response<S: Into<String>>(msg: S) -> Self {
        Self::BadResponse(msg.into())
    }
}

/// Result type alias using WalletError
pub type WalletResult<T> = Result<T, WalletError>;
