//! # Simulator & Account Session Handle
//!
//! The public, ergonomic surface over calling and viewing contracts: a
//! `Simulator` root type owning the Account Store and VM Driver, and an
//! `Account` handle exposing `call`/`view` so usage reads as
//! `alice.call(...)`/`alice.view(...)`.

use crate::adapters::{InMemoryAccountStore, ProcessVmDriver};
use crate::config::SimulatorConfig;
use crate::domain::context::ContextOverride;
use crate::domain::outcome::Outcome;
use crate::domain::value_objects::AccountId;
use crate::errors::{AccountError, SchedulerError};
use crate::ports::{AccountStore, VmDriver};
use crate::scheduler::{CallOutcome, PromiseScheduler};
use crate::step::{CallRequest, StepExecutor};
use std::path::PathBuf;

/// Terminates the process immediately with a diagnostic on non-POSIX
/// hosts. The simulator shells out to a POSIX child process protocol;
/// there is no supported Windows code path to degrade into.
#[cfg(windows)]
fn assert_posix_host() {
    eprintln!("promise-sim requires a POSIX host; Windows is not supported");
    std::process::exit(1);
}

#[cfg(not(windows))]
fn assert_posix_host() {}

/// Owns the Account Store and VM Driver for one simulated session.
///
/// Generic over both ports so tests can inject an in-process fake
/// driver without spawning a subprocess, while `Simulator::new` wires
/// up the real [`InMemoryAccountStore`]/[`ProcessVmDriver`] pair for
/// ordinary use.
pub struct Simulator<S: AccountStore = InMemoryAccountStore, D: VmDriver = ProcessVmDriver> {
    config: SimulatorConfig,
    store: S,
    driver: D,
}

impl Simulator<InMemoryAccountStore, ProcessVmDriver> {
    /// Creates a simulator backed by an in-memory account store and a
    /// subprocess VM Driver at `config.vm_driver_path`.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        assert_posix_host();
        let driver = ProcessVmDriver::new(config.vm_driver_path.clone());
        Self {
            config,
            store: InMemoryAccountStore::new(),
            driver,
        }
    }
}

impl<S: AccountStore, D: VmDriver> Simulator<S, D> {
    /// Creates a simulator from already-constructed ports, for tests
    /// that need a fake driver or a bespoke store.
    #[must_use]
    pub fn with_parts(config: SimulatorConfig, store: S, driver: D) -> Self {
        assert_posix_host();
        Self {
            config,
            store,
            driver,
        }
    }

    /// Explicitly creates an account with an optional contract image.
    pub fn new_account(
        &mut self,
        id: impl Into<AccountId>,
        contract_image: Option<PathBuf>,
    ) -> Result<(), AccountError> {
        self.store.new_account(id.into(), contract_image)
    }

    /// Returns a session handle for `id`, creating it with defaults if
    /// it doesn't already exist.
    pub fn get_account(&mut self, id: impl Into<AccountId>) -> Account<'_, S, D> {
        let account_id = id.into();
        self.store.get_or_create(&account_id);
        Account {
            simulator: self,
            account_id,
        }
    }

    /// Returns a read-only snapshot of `id`'s stored record — balance,
    /// storage usage, and encoded state — for observers that don't need
    /// a full session handle.
    pub fn inspect_account(&self, id: &AccountId) -> Result<&crate::domain::account::Account, AccountError> {
        self.store.get(id)
    }

    /// Overrides the block height/timestamp surfaced to the VM Driver
    /// via `VMContext` for all subsequent calls.
    pub fn set_context(&mut self, block_height: u64, block_timestamp: u64) {
        self.config.block_height = block_height;
        self.config.block_timestamp = block_timestamp;
    }

    /// Resets every account to its default balance/storage/state.
    pub fn reset_all(&mut self) {
        self.store.reset_all();
    }
}

/// An ergonomic handle onto one account within a [`Simulator`] session.
pub struct Account<'a, S: AccountStore, D: VmDriver> {
    simulator: &'a mut Simulator<S, D>,
    account_id: AccountId,
}

impl<'a, S: AccountStore, D: VmDriver> Account<'a, S, D> {
    /// The account identifier this handle addresses.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Drives a mutating call and its entire receipt graph to
    /// completion.
    pub fn call(
        &mut self,
        method_name: impl Into<String>,
        input: impl Into<String>,
    ) -> Result<CallOutcome, SchedulerError> {
        let scheduler = PromiseScheduler::new(&self.simulator.config);
        scheduler.call(
            &mut self.simulator.store,
            &self.simulator.driver,
            self.account_id.clone(),
            method_name,
            input,
            ContextOverride::default(),
        )
    }

    /// Executes a single side-effect-free view call: no scheduler loop,
    /// commits always suppressed.
    pub fn view(
        &mut self,
        method_name: impl Into<String>,
        input: impl Into<String>,
    ) -> Result<Outcome, SchedulerError> {
        let executor = StepExecutor::new(&self.simulator.config);
        let request = CallRequest {
            account_id: self.account_id.clone(),
            method_name: method_name.into(),
            input: input.into(),
            is_view: true,
            context_override: ContextOverride::default(),
            input_data: vec![],
            output_data_receivers: vec![],
        };
        let result = executor.call_step(&mut self.simulator.store, &self.simulator.driver, request)?;
        Ok(result.outcome)
    }
}
