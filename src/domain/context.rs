//! # VM Context & Context Builder
//!
//! `VMContext` is the complete input bundle handed to the VM Driver. The
//! `ContextBuilder` merges a caller's partial override with simulator-wide
//! defaults and the callee account's current snapshot, the same
//! inherit-then-override shape as a child execution context.

use crate::config::SimulatorConfig;
use crate::domain::account::Account;
use crate::domain::outcome::PromiseResult;
use crate::domain::value_objects::AccountId;
use serde::{Deserialize, Serialize};

/// Complete input bundle handed to the VM Driver for a single step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VMContext {
    /// Account the method is executing against.
    pub current_account_id: AccountId,
    /// Account that signed the originating transaction.
    pub signer_account_id: AccountId,
    /// Base58-encoded public key of `signer_account_id`.
    pub signer_account_pk: String,
    /// The immediate caller (differs from signer across cross-contract hops).
    pub predecessor_account_id: AccountId,
    /// Method arguments, as passed by the caller.
    pub input: String,
    /// Resolved promise results for this call's `input_data`, in order.
    pub input_data: Vec<PromiseResult>,
    /// Accounts awaiting this call's result.
    pub output_data_receivers: Vec<AccountId>,
    /// Gas attached to this call.
    pub prepaid_gas: u64,
    /// Deposit attached to this call.
    pub attached_deposit: u128,
    /// Callee's balance snapshot prior to this call.
    pub account_balance: u128,
    /// Callee's locked-balance snapshot prior to this call.
    pub account_locked_balance: u128,
    /// Callee's storage usage snapshot prior to this call.
    pub storage_usage: u64,
    /// Whether this is a side-effect-free view call.
    pub is_view: bool,
    /// Simulator-wide block height override.
    pub block_height: u64,
    /// Simulator-wide block timestamp override.
    pub block_timestamp: u64,
}

/// A caller-supplied, possibly-partial context override.
#[derive(Clone, Debug, Default)]
pub struct ContextOverride {
    /// Explicit signer, if the caller wants to impersonate someone other
    /// than the callee.
    pub signer_account_id: Option<AccountId>,
    /// Explicit predecessor, if the caller wants to simulate a
    /// cross-contract hop directly.
    pub predecessor_account_id: Option<AccountId>,
    /// Gas attached to the call.
    pub prepaid_gas: Option<u64>,
    /// Deposit attached to the call.
    pub attached_deposit: Option<u128>,
}

/// Builds complete [`VMContext`] values from a partial override, the
/// simulator's defaults, and the callee account's current snapshot.
pub struct ContextBuilder<'a> {
    config: &'a SimulatorConfig,
}

impl<'a> ContextBuilder<'a> {
    /// Creates a builder bound to a simulator's configuration.
    #[must_use]
    pub fn new(config: &'a SimulatorConfig) -> Self {
        Self { config }
    }

    /// Builds a complete context for a call against `callee`.
    ///
    /// Rules, applied in order:
    /// 1. `signer_account_id` defaults to `current_account_id`.
    /// 2. `predecessor_account_id` defaults to `signer_account_id`.
    /// 3. `signer_account_pk` is derived from the signer's stored key.
    /// 4. Balance/locked-balance/storage snapshots come from `callee`.
    /// 5. Block height/timestamp are overlaid from simulator-wide config.
    #[must_use]
    pub fn build(
        &self,
        callee: &Account,
        method_input: String,
        input_data: Vec<PromiseResult>,
        output_data_receivers: Vec<AccountId>,
        is_view: bool,
        over: &ContextOverride,
        signer_pk: &str,
    ) -> VMContext {
        let signer_account_id = over
            .signer_account_id
            .clone()
            .unwrap_or_else(|| callee.account_id.clone());
        let predecessor_account_id = over
            .predecessor_account_id
            .clone()
            .unwrap_or_else(|| signer_account_id.clone());

        VMContext {
            current_account_id: callee.account_id.clone(),
            signer_account_id,
            signer_account_pk: signer_pk.to_string(),
            predecessor_account_id,
            input: method_input,
            input_data,
            output_data_receivers,
            prepaid_gas: over.prepaid_gas.unwrap_or(self.config.default_gas),
            attached_deposit: over.attached_deposit.unwrap_or(0),
            account_balance: callee.balance,
            account_locked_balance: callee.locked_balance,
            storage_usage: callee.storage_usage,
            is_view,
            block_height: self.config.block_height,
            block_timestamp: self.config.block_timestamp,
        }
    }
}
