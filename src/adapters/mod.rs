//! Concrete implementations of the simulator's ports.

pub mod memory_account_store;
pub mod process_driver;

pub use memory_account_store::InMemoryAccountStore;
pub use process_driver::ProcessVmDriver;
