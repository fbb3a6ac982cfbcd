//! Transaction construction and signing.
//!
//! Builds the single-operation envelopes this wallet needs (payment and
//! create-account), binds them to a network passphrase, and signs with
//! the source keypair. The envelope hash doubles as the transaction
//! hash Horizon reports back on success.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

use super::xdr::Encoder;
use super::{Network, MEMO_TEXT_MAX_BYTES, TX_VALIDITY_WINDOW_SECS};
use crate::error::{WalletError, WalletResult};
use crate::wallet::KeyPair;

const ENVELOPE_TYPE_TX: u32 = 2;

const CRYPTO_KEY_TYPE_ED25519: u32 = 0;
const PUBLIC_KEY_TYPE_ED25519: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const MEMO_TEXT: u32 = 1;
const ASSET_TYPE_NATIVE: u32 = 0;
const OP_CREATE_ACCOUNT: u32 = 0;
const OP_PAYMENT: u32 = 1;

/// The one operation an envelope carries.
pub(crate) enum Operation {
    Payment {
        destination: [u8; 32],
        amount: i64,
    },
    CreateAccount {
        destination: [u8; 32],
        starting_balance: i64,
    },
}

/// A signed, submittable transaction envelope.
#[derive(Debug)]
pub(crate) struct SignedEnvelope {
    /// Base64 XDR, the form Horizon's submission endpoint accepts.
    pub base64: String,
    /// Hex transaction hash, known before submission.
    pub hash: String,
}

/// Build and sign a single-operation transaction.
///
/// `sequence` is the number the transaction consumes (current account
/// sequence + 1). The validity window opens immediately and closes
/// [`TX_VALIDITY_WINDOW_SECS`] after `now_unix`.
pub(crate) fn build_envelope(
    source: &KeyPair,
    sequence: i64,
    fee: u32,
    memo: Option<&str>,
    operation: Operation,
    network: Network,
    now_unix: u64,
) -> WalletResult<SignedEnvelope> {
    if let Some(text) = memo {
        if text.len() > MEMO_TEXT_MAX_BYTES {
            return Err(WalletError::InvalidMemo(format!(
                "memo exceeds {MEMO_TEXT_MAX_BYTES} bytes"
            )));
        }
    }

    let mut tx = Encoder::new();
    // Source account, as a muxed ed25519 key.
    tx.u32(CRYPTO_KEY_TYPE_ED25519);
    tx.opaque(&source.public_key_bytes());
    tx.u32(fee);
    tx.i64(sequence);
    // Preconditions: a single time-bound window.
    tx.u32(PRECOND_TIME);
    tx.u64(0);
    tx.u64(now_unix + TX_VALIDITY_WINDOW_SECS);
    match memo {
        None => tx.u32(MEMO_NONE),
        Some(text) => {
            tx.u32(MEMO_TEXT);
            tx.string(text);
        }
    }
    // Exactly one operation, with no per-operation source override.
    tx.u32(1);
    tx.u32(0);
    match operation {
        Operation::Payment {
            destination,
            amount,
        } => {
            tx.u32(OP_PAYMENT);
            tx.u32(CRYPTO_KEY_TYPE_ED25519);
            tx.opaque(&destination);
            tx.u32(ASSET_TYPE_NATIVE);
            tx.i64(amount);
        }
        Operation::CreateAccount {
            destination,
            starting_balance,
        } => {
            tx.u32(OP_CREATE_ACCOUNT);
            tx.u32(PUBLIC_KEY_TYPE_ED25519);
            tx.opaque(&destination);
            tx.i64(starting_balance);
        }
    }
    // Transaction ext: version 0.
    tx.u32(0);
    let tx_bytes = tx.into_bytes();

    // The signature payload binds the network: hash over the network id,
    // the envelope type tag, and the transaction body.
    let network_id = Sha256::digest(network.passphrase().as_bytes());
    let mut payload = Vec::with_capacity(network_id.len() + 4 + tx_bytes.len());
    payload.extend_from_slice(&network_id);
    payload.extend_from_slice(&ENVELOPE_TYPE_TX.to_be_bytes());
    payload.extend_from_slice(&tx_bytes);
    let hash = Sha256::digest(&payload);
    let signature = source.sign(&hash);

    let mut envelope = Encoder::new();
    envelope.u32(ENVELOPE_TYPE_TX);
    envelope.raw(&tx_bytes);
    envelope.u32(1);
    envelope.opaque(&source.signature_hint());
    envelope.var_opaque(&signature);

    Ok(SignedEnvelope {
        base64: BASE64.encode(envelope.into_bytes()),
        hash: hex::encode(hash),
    })
}
