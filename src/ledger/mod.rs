//! Ledger-facing types: network environments, account snapshots,
//! payment history records, and native-asset amount handling.

pub mod horizon;
pub(crate) mod tx;
pub(crate) mod xdr;

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

pub use horizon::LedgerClient;

/// Stroops per whole unit of the native asset (7 decimal places).
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Base reserve per ledger entry, in stroops.
pub const BASE_RESERVE_STROOPS: i64 = 5_000_000;

/// Every account carries two base entries before its subentries.
pub const BASE_ACCOUNT_ENTRIES: i64 = 2;

/// Starting balance funded into a newly activated account: 1 unit.
pub const ACTIVATION_STARTING_BALANCE_STROOPS: i64 = STROOPS_PER_UNIT;

/// How long a built transaction stays valid after construction.
pub const TX_VALIDITY_WINDOW_SECS: u64 = 40;

/// Maximum text memo length, in bytes.
pub const MEMO_TEXT_MAX_BYTES: usize = 28;

/// Ledger environment. Endpoint and signing passphrase are fixed
/// constants per environment; the passphrase is baked into every
/// signature, so a transaction signed for one network is invalid on
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn horizon_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://api.mainnet.minepi.com",
            Self::Testnet => "https://api.testnet.minepi.com",
        }
    }

    pub fn passphrase(self) -> &'static str {
        match self {
            Self::Mainnet => "Pi Network",
            Self::Testnet => "Pi Testnet",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mainnet" => Some(Self::Mainnet),
            "testnet" => Some(Self::Testnet),
            _ => None,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown network '{s}', expected mainnet or testnet"))
    }
}

/// Immutable snapshot of on-ledger account state, produced by an
/// explicit reload and stale until the next one.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub account_id: String,
    pub activated: bool,
    /// Native balance in stroops; `None` until the account is activated.
    pub balance: Option<i64>,
    pub sequence: i64,
    pub subentry_count: u32,
}

impl AccountState {
    /// Minimum balance the ledger requires this account to retain.
    pub fn reserve(&self) -> i64 {
        (BASE_ACCOUNT_ENTRIES + i64::from(self.subentry_count)) * BASE_RESERVE_STROOPS
    }

    /// Balance actually available to spend: raw balance minus the
    /// reserve. This is the figure used both for display and for
    /// pre-submission spend checks.
    pub fn spendable_balance(&self) -> i64 {
        self.balance
            .unwrap_or(0)
            .saturating_sub(self.reserve())
            .max(0)
    }
}

/// One confirmed history entry, as reported by the ledger. Read-only.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: String,
    pub paging_token: String,
    pub transaction_hash: String,
    pub created_at: String,
    pub detail: PaymentDetail,
}

#[derive(Debug, Clone)]
pub enum PaymentDetail {
    Payment {
        from: String,
        to: String,
        amount: i64,
    },
    CreateAccount {
        funder: String,
        account: String,
        starting_balance: i64,
    },
    /// An operation kind this wallet does not construct itself.
    Other { kind: String },
}

/// One page of history plus the cursor for the next one. `next_cursor`
/// is `None` once the ledger returns a short page.
#[derive(Debug, Clone)]
pub struct PaymentPage {
    pub records: Vec<PaymentRecord>,
    pub next_cursor: Option<String>,
}

/// Parse a decimal amount string into stroops, rejecting zero and
/// negative values. Payments allow at most 7 decimal places.
pub fn parse_amount(input: &str) -> WalletResult<i64> {
    let stroops = parse_decimal(input)?;
    if stroops == 0 {
        return Err(WalletError::InvalidAmount(input.to_string()));
    }
    Ok(stroops)
}

/// Parse a non-negative decimal string into stroops. Used for balances,
/// where zero is meaningful.
pub(crate) fn parse_decimal(input: &str) -> WalletResult<i64> {
    let invalid = || WalletError::InvalidAmount(input.to_string());
    let s = input.trim();
    if s.is_empty() || s.starts_with('+') || s.starts_with('-') {
        return Err(invalid());
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 7 {
        return Err(invalid());
    }
    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut frac_stroops: i64 = 0;
    if !frac.is_empty() {
        let padded = format!("{frac:0<7}");
        frac_stroops = padded.parse().map_err(|_| invalid())?;
    }
    whole_units
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|v| v.checked_add(frac_stroops))
        .ok_or_else(invalid)
}

/// Render stroops as a 7-decimal amount string, the ledger's own
/// formatting.
pub fn format_stroops(stroops: i64) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    format!(
        "{sign}{}.{:07}",
        abs / STROOPS_PER_UNIT as u64,
        abs % STROOPS_PER_UNIT as u64
    )
}
