//! Horizon REST client for account queries, payment history, and
//! transaction submission.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::tx::{self, Operation};
use super::{
    parse_amount, parse_decimal, AccountState, Network, PaymentDetail, PaymentPage, PaymentRecord,
    ACTIVATION_STARTING_BALANCE_STROOPS, MEMO_TEXT_MAX_BYTES, TX_VALIDITY_WINDOW_SECS,
};
use crate::error::{WalletError, WalletResult};
use crate::wallet::{strkey, KeyPair};

/// Timeout for read-only queries.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
/// Submission shares the transaction's own validity window.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(TX_VALIDITY_WINDOW_SECS);

// --- Horizon response types ---

#[derive(Deserialize)]
struct HorizonAccount {
    sequence: String,
    #[serde(default)]
    subentry_count: u32,
    balances: Vec<HorizonBalance>,
}

#[derive(Deserialize)]
struct HorizonBalance {
    balance: String,
    asset_type: String,
}

#[derive(Deserialize)]
struct HorizonFeeStats {
    last_ledger_base_fee: String,
}

#[derive(Deserialize)]
struct HorizonPaymentsResponse {
    #[serde(rename = "_embedded")]
    embedded: HorizonEmbedded,
}

#[derive(Deserialize)]
struct HorizonEmbedded {
    records: Vec<HorizonOperation>,
}

#[derive(Deserialize)]
struct HorizonOperation {
    id: String,
    paging_token: String,
    #[serde(rename = "type")]
    kind: String,
    transaction_hash: String,
    created_at: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    funder: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    starting_balance: Option<String>,
}

#[derive(Deserialize)]
struct HorizonSubmitSuccess {
    hash: String,
}

#[derive(Deserialize)]
struct HorizonProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extras: Option<HorizonExtras>,
}

#[derive(Deserialize)]
struct HorizonExtras {
    #[serde(default)]
    result_codes: Option<HorizonResultCodes>,
}

#[derive(Deserialize)]
struct HorizonResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

/// REST client for one Horizon environment.
///
/// Holds no wallet identity of its own; every signing operation takes
/// the source [`KeyPair`] explicitly. Snapshots it returns are
/// immutable; refreshing state means calling again.
pub struct LedgerClient {
    network: Network,
    base_url: String,
    http: reqwest::Client,
}

impl LedgerClient {
    /// Client for a network's canonical Horizon endpoint.
    pub fn new(network: Network) -> Self {
        Self::with_base_url(network, network.horizon_url())
    }

    /// Client with an endpoint override. The signing passphrase still
    /// follows `network`.
    pub fn with_base_url(network: Network, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            network,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Fetch a fresh account snapshot by public key.
    ///
    /// A not-found response means the address has never been funded:
    /// the caller gets [`WalletError::AccountNotActivated`], a
    /// recoverable state rather than a fatal one.
    pub async fn load_account(&self, account_id: &str) -> WalletResult<AccountState> {
        if !strkey::is_valid_account_id(account_id) {
            return Err(WalletError::InvalidAddress(account_id.to_string()));
        }
        let url = format!("{}/accounts/{}", self.base_url, account_id);
        debug!(%url, "loading account");
        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(account = %account_id, "account not present on ledger");
            return Err(WalletError::AccountNotActivated(account_id.to_string()));
        }
        let body: HorizonAccount = resp.error_for_status()?.json().await?;

        let sequence: i64 = body
            .sequence
            .parse()
            .map_err(|_| WalletError::bad_response("unparseable account sequence"))?;
        let native = body
            .balances
            .iter()
            .find(|b| b.asset_type == "native")
            .ok_or_else(|| WalletError::bad_response("account has no native balance entry"))?;
        let balance = parse_decimal(&native.balance)
            .map_err(|_| WalletError::bad_response("unparseable native balance"))?;

        Ok(AccountState {
            account_id: account_id.to_string(),
            activated: true,
            balance: Some(balance),
            sequence,
            subentry_count: body.subentry_count,
        })
    }

    /// Current base fee in stroops, from the fee-stats endpoint. Always
    /// fetched immediately before building a transaction.
    pub async fn fetch_base_fee(&self) -> WalletResult<u32> {
        let url = format!("{}/fee_stats", self.base_url);
        let stats: HorizonFeeStats = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        stats
            .last_ledger_base_fee
            .parse()
            .map_err(|_| WalletError::bad_response("unparseable base fee"))
    }

    /// One page of payment history, newest first.
    ///
    /// Pass the previous page's cursor to continue. A page shorter than
    /// `limit` is the last one. Every call is a fresh round trip; the
    /// caller owns merging pages.
    pub async fn payments(
        &self,
        account_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> WalletResult<PaymentPage> {
        if !strkey::is_valid_account_id(account_id) {
            return Err(WalletError::InvalidAddress(account_id.to_string()));
        }
        let mut url = format!(
            "{}/accounts/{}/payments?order=desc&limit={}",
            self.base_url, account_id, limit
        );
        if let Some(cursor) = cursor {
            url.push_str("&cursor=");
            url.push_str(cursor);
        }
        debug!(%url, "loading payment history page");
        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(WalletError::AccountNotActivated(account_id.to_string()));
        }
        let body: HorizonPaymentsResponse = resp.error_for_status()?.json().await?;

        let records: Vec<PaymentRecord> = body
            .embedded
            .records
            .into_iter()
            .map(PaymentRecord::from)
            .collect();
        Ok(page_from(records, limit))
    }

    /// Build, sign, and submit a native-asset payment. Returns the
    /// confirmed transaction hash.
    pub async fn send_payment(
        &self,
        source: &KeyPair,
        destination: &str,
        amount: &str,
        memo: Option<&str>,
    ) -> WalletResult<String> {
        let dest_key = strkey::decode_account_id(destination)?;
        let amount_stroops = parse_amount(amount)?;
        self.submit_operation(
            source,
            amount_stroops,
            Operation::Payment {
                destination: dest_key,
                amount: amount_stroops,
            },
            memo,
        )
        .await
    }

    /// Fund a not-yet-existing address with the fixed starting balance,
    /// creating it on the ledger.
    pub async fn activate_account(
        &self,
        source: &KeyPair,
        destination: &str,
    ) -> WalletResult<String> {
        let dest_key = strkey::decode_account_id(destination)?;
        self.submit_operation(
            source,
            ACTIVATION_STARTING_BALANCE_STROOPS,
            Operation::CreateAccount {
                destination: dest_key,
                starting_balance: ACTIVATION_STARTING_BALANCE_STROOPS,
            },
            None,
        )
        .await
    }

    /// Shared flow for both transaction kinds: fresh sequence and fee,
    /// local spend check, build, sign, submit.
    async fn submit_operation(
        &self,
        source: &KeyPair,
        amount_stroops: i64,
        operation: Operation,
        memo: Option<&str>,
    ) -> WalletResult<String> {
        if let Some(text) = memo {
            if text.len() > MEMO_TEXT_MAX_BYTES {
                return Err(WalletError::InvalidMemo(format!(
                    "memo exceeds {MEMO_TEXT_MAX_BYTES} bytes"
                )));
            }
        }

        let account = self.load_account(source.address()).await?;
        let fee = self.fetch_base_fee().await?;
        ensure_spendable(&account, amount_stroops, fee)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        let envelope = tx::build_envelope(
            source,
            account.sequence + 1,
            fee,
            memo,
            operation,
            self.network,
            now,
        )?;
        debug!(hash = %envelope.hash, "submitting transaction");
        self.submit_envelope(&envelope.base64).await
    }

    /// POST a signed envelope. Distinguishes a definite ledger
    /// rejection from an ambiguous outcome: after the envelope has been
    /// handed to the network, a timeout no longer means "not applied".
    async fn submit_envelope(&self, envelope_base64: &str) -> WalletResult<String> {
        let url = format!("{}/transactions", self.base_url);
        let result = self
            .http
            .post(&url)
            .timeout(SUBMIT_TIMEOUT)
            .form(&[("tx", envelope_base64)])
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) if e.is_connect() => return Err(WalletError::Http(e)),
            Err(e) if e.is_timeout() => {
                warn!("submission timed out; outcome unknown");
                return Err(WalletError::AmbiguousSubmission(
                    "submission timed out before the ledger answered".into(),
                ));
            }
            Err(e) => return Err(WalletError::Http(e)),
        };

        match resp.status() {
            status if status.is_success() => {
                let body: HorizonSubmitSuccess = resp.json().await.map_err(|_| {
                    WalletError::AmbiguousSubmission(
                        "ledger accepted the transaction but the response was unreadable".into(),
                    )
                })?;
                Ok(body.hash)
            }
            StatusCode::BAD_REQUEST => {
                let reason = match resp.json::<HorizonProblem>().await {
                    Ok(problem) => rejection_reason(&problem),
                    Err(_) => "transaction malformed or refused".to_string(),
                };
                warn!(%reason, "transaction rejected");
                Err(WalletError::TransactionRejected(reason))
            }
            StatusCode::GATEWAY_TIMEOUT => Err(WalletError::AmbiguousSubmission(
                "ledger timed out while applying the transaction".into(),
            )),
            status => {
                warn!(%status, "unexpected submission response");
                Err(WalletError::bad_response(format!(
                    "unexpected submission status {status}"
                )))
            }
        }
    }
}

impl From<HorizonOperation> for PaymentRecord {
    fn from(op: HorizonOperation) -> Self {
        let detail = match op.kind.as_str() {
            "payment" => match (op.from, op.to, op.amount) {
                (Some(from), Some(to), Some(amount)) => PaymentDetail::Payment {
                    from,
                    to,
                    amount: parse_decimal(&amount).unwrap_or(0),
                },
                _ => PaymentDetail::Other { kind: op.kind.clone() },
            },
            "create_account" => match (op.funder, op.account, op.starting_balance) {
                (Some(funder), Some(account), Some(starting_balance)) => {
                    PaymentDetail::CreateAccount {
                        funder,
                        account,
                        starting_balance: parse_decimal(&starting_balance).unwrap_or(0),
                    }
                }
                _ => PaymentDetail::Other { kind: op.kind.clone() },
            },
            _ => PaymentDetail::Other { kind: op.kind.clone() },
        };
        Self {
            id: op.id,
            paging_token: op.paging_token,
            transaction_hash: op.transaction_hash,
            created_at: op.created_at,
            detail,
        }
    }
}

/// Spend check applied before any envelope is built: the amount plus
/// the fee must fit inside the reserve-adjusted balance.
fn ensure_spendable(account: &AccountState, amount_stroops: i64, fee: u32) -> WalletResult<()> {
    let required = amount_stroops.saturating_add(i64::from(fee));
    let available = account.spendable_balance();
    if required > available {
        return Err(WalletError::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

/// Assemble a history page. A page shorter than `limit` is the last
/// one and carries no continuation cursor.
fn page_from(records: Vec<PaymentRecord>, limit: u32) -> PaymentPage {
    let next_cursor = if records.len() < limit as usize {
        None
    } else {
        records.last().map(|r| r.paging_token.clone())
    };
    PaymentPage {
        records,
        next_cursor,
    }
}

/// Flatten Horizon's structured rejection into one reason string, e.g.
/// `tx_failed (op_underfunded)`.
fn rejection_reason(problem: &HorizonProblem) -> String {
    if let Some(codes) = problem.extras.as_ref().and_then(|e| e.result_codes.as_ref()) {
        let mut reason = codes
            .transaction
            .clone()
            .unwrap_or_else(|| "tx_failed".to_string());
        if !codes.operations.is_empty() {
            reason.push_str(&format!(" ({})", codes.operations.join(", ")));
        }
        return reason;
    }
    problem
        .title
        .clone()
        .unwrap_or_else(|| "transaction malformed or refused".to_string())
}
