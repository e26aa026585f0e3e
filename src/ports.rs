//! # Ports
//!
//! Trait seams the Step Executor and Promise Scheduler depend on: the
//! subsystem under test depends on a trait, never a concrete adapter,
//! so a fake driver or fake store can stand in under test.

use crate::domain::account::Account;
use crate::domain::context::VMContext;
use crate::domain::outcome::{Outcome, PromiseResult, Receipt};
use crate::domain::value_objects::AccountId;
use crate::errors::{AccountError, DriverError};
use std::path::{Path, PathBuf};

/// A single VM Driver invocation's parsed response.
#[derive(Clone, Debug)]
pub struct DriverResponse {
    /// The reported outcome.
    pub outcome: Outcome,
    /// Receipts emitted by the step.
    pub receipts: Vec<Receipt>,
    /// The driver-consumed encoded post-state.
    pub state: String,
}

/// The external, opaque VM evaluator.
///
/// A blocking, single-shot call: given a context, method, input, prior
/// state, contract image and resolved dependencies, it produces an
/// outcome plus zero or more receipts. Synchronous by contract — the
/// scheduler is single-threaded and has nothing to overlap this call
/// with.
pub trait VmDriver {
    /// Invokes the driver for one (account, method, input, state) step.
    fn invoke(
        &self,
        context: &VMContext,
        method_name: &str,
        input: &str,
        wasm_file: Option<&Path>,
        state: &str,
        promise_results: &[PromiseResult],
    ) -> Result<DriverResponse, DriverError>;
}

/// The Account Store port.
///
/// Implementations are single-threaded: the simulator never touches an
/// account outside the Step Executor's commit path, so no interior
/// synchronization is required.
pub trait AccountStore {
    /// Explicitly creates an account with an optional contract image.
    /// Fails with [`AccountError::MissingContract`] if the contract
    /// image path doesn't resolve to an existing artifact.
    fn new_account(
        &mut self,
        id: AccountId,
        contract_image: Option<PathBuf>,
    ) -> Result<(), AccountError>;

    /// Returns the account for `id`, creating it with defaults if absent.
    fn get_or_create(&mut self, id: &AccountId) -> &mut Account;

    /// Returns the account for `id`. Fails with
    /// [`AccountError::UnknownAccount`] if it was never added.
    fn get(&self, id: &AccountId) -> Result<&Account, AccountError>;

    /// Returns a mutable handle to the account for `id`. Fails with
    /// [`AccountError::UnknownAccount`] if it was never added.
    fn get_mut(&mut self, id: &AccountId) -> Result<&mut Account, AccountError>;

    /// Resets every account to its default balance/storage/state,
    /// without removing any of them.
    fn reset_all(&mut self);
}
