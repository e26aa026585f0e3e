//! A local, single-process simulator for a sharded, promise-oriented
//! smart-contract execution environment.
//!
//! The hard part this crate implements is the promise-scheduling
//! runtime: given a root contract invocation, it repeatedly executes
//! individual contract methods through an opaque external VM Driver,
//! collects the receipts and data dependencies each step emits, and
//! drives the resulting dependency graph to completion — propagating
//! return values, failures, balances and persisted contract state along
//! the way.
//!
//! ```no_run
//! use promise_sim::prelude::*;
//!
//! let mut sim = Simulator::new(SimulatorConfig::default());
//! sim.new_account("alice", None).unwrap();
//! let mut alice = sim.get_account("alice");
//! let outcome = alice.call("increment", "{}").unwrap();
//! println!("{:?}", outcome.return_value);
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod scheduler;
pub mod simulator;
pub mod step;

/// Commonly used types, re-exported for a single `use` line.
pub mod prelude {
    pub use crate::adapters::{InMemoryAccountStore, ProcessVmDriver};
    pub use crate::config::SimulatorConfig;
    pub use crate::domain::account::Account as AccountRecord;
    pub use crate::domain::context::{ContextOverride, VMContext};
    pub use crate::domain::outcome::{Action, Outcome, PromiseResult, Receipt, ReturnData, StepResult};
    pub use crate::domain::value_objects::{AccountId, Gas};
    pub use crate::errors::{AccountError, DriverError, SchedulerError};
    pub use crate::ports::{AccountStore, DriverResponse, VmDriver};
    pub use crate::scheduler::{CallDescriptor, CallOutcome, PromiseScheduler};
    pub use crate::simulator::{Account, Simulator};
    pub use crate::step::{CallRequest, StepExecutor};
}
