//! # Account
//!
//! The persisted record the Account Store hands out: balances, storage
//! usage, the opaque contract-state blob, and the derived signer key.

use crate::config::{DEFAULT_BALANCE, DEFAULT_STORAGE_USAGE};
use crate::domain::value_objects::AccountId;
use crate::errors::AccountError;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Width of the signer-key derivation window (`account_id[0..32]`).
const SIGNER_KEY_WINDOW: usize = 32;

/// The decoded, externally visible shape of a contract's persisted storage.
pub type DecodedState = BTreeMap<String, Vec<u8>>;

/// An account in the simulated chain: a client account if `contract_image`
/// is `None`, otherwise a contract account.
#[derive(Clone, Debug)]
pub struct Account {
    /// Stable string identifier.
    pub account_id: AccountId,
    /// Handle to the contract binary, if this account hosts a contract.
    pub contract_image: Option<PathBuf>,
    /// Derived deterministically from `account_id`; never mutated directly.
    pub signer_key: String,
    /// Non-negative token balance.
    pub balance: u128,
    /// Non-negative locked token balance.
    pub locked_balance: u128,
    /// Non-negative storage usage, in bytes.
    pub storage_usage: u64,
    /// The driver-consumed encoded form of this contract's persisted state.
    state: String,
}

impl Account {
    /// Creates a new account with default balance and storage usage.
    ///
    /// Fails with [`AccountError::MissingContract`] if `contract_image` is
    /// `Some` and the path does not resolve to an existing artifact.
    pub fn new(
        account_id: AccountId,
        contract_image: Option<PathBuf>,
    ) -> Result<Self, AccountError> {
        if let Some(path) = &contract_image {
            if !path.exists() {
                return Err(AccountError::MissingContract {
                    account: account_id,
                    path: path.display().to_string(),
                });
            }
        }
        let signer_key = derive_signer_key(&account_id);
        Ok(Self {
            account_id,
            contract_image,
            signer_key,
            balance: DEFAULT_BALANCE,
            locked_balance: 0,
            storage_usage: DEFAULT_STORAGE_USAGE,
            state: encode_state(&DecodedState::new()),
        })
    }

    /// Resets balance, locked balance, storage usage and state to their
    /// defaults. The account itself is never removed.
    pub fn reset(&mut self) {
        self.balance = DEFAULT_BALANCE;
        self.locked_balance = 0;
        self.storage_usage = DEFAULT_STORAGE_USAGE;
        self.state = encode_state(&DecodedState::new());
    }

    /// Returns the driver-consumed encoded state blob.
    #[must_use]
    pub fn encoded_state(&self) -> &str {
        &self.state
    }

    /// Overwrites the encoded state blob (commit path only).
    pub fn set_encoded_state(&mut self, encoded: String) {
        self.state = encoded;
    }

    /// Decodes the current state into its externally visible key/value form.
    pub fn decoded_state(&self) -> Result<DecodedState, AccountError> {
        decode_state(&self.state)
            .map_err(|e| AccountError::MalformedState(self.account_id.clone(), e))
    }
}

/// Derives the base58 signer key for an account id.
///
/// `signer_key = base58(right_pad(account_id[0..32], ' ', 32))`. A pure
/// function of `account_id`: reproduced bit-exactly wherever it is needed,
/// never cached in a way that could drift from the identifier it names.
#[must_use]
pub fn derive_signer_key(account_id: &AccountId) -> String {
    let bytes = account_id.as_str().as_bytes();
    let mut window = [b' '; SIGNER_KEY_WINDOW];
    let take = bytes.len().min(SIGNER_KEY_WINDOW);
    window[..take].copy_from_slice(&bytes[..take]);
    bs58::encode(window).into_string()
}

/// Encodes a decoded state map into the driver-consumed blob.
///
/// The blob is a JSON object over a `BTreeMap` (so key order is
/// canonical) with values base64-encoded, matching the string-typed
/// `--state` argument the VM Driver expects.
#[must_use]
pub fn encode_state(decoded: &DecodedState) -> String {
    let encoded_values: BTreeMap<&String, String> = decoded
        .iter()
        .map(|(k, v)| (k, base64::engine::general_purpose::STANDARD.encode(v)))
        .collect();
    serde_json::to_string(&encoded_values).expect("BTreeMap<String, String> always serializes")
}

/// Decodes a driver-consumed state blob back into key/value form.
///
/// Inverse of [`encode_state`]; `decode(encode(s)) == s` for any decoded
/// map `s`, and `encode(decode(b)) == b` for any blob `b` produced by
/// `encode_state`.
pub fn decode_state(encoded: &str) -> Result<DecodedState, String> {
    let raw: BTreeMap<String, String> =
        serde_json::from_str(encoded).map_err(|e| format!("invalid state JSON: {e}"))?;
    raw.into_iter()
        .map(|(k, v)| {
            base64::engine::general_purpose::STANDARD
                .decode(v)
                .map(|bytes| (k.clone(), bytes))
                .map_err(move |e| format!("invalid base64 value for key {k:?}: {e}"))
        })
        .collect()
}
