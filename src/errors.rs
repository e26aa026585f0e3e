//! # Error Types
//!
//! All error types for the promise-scheduling simulator.

use crate::domain::value_objects::AccountId;
use thiserror::Error;

// =============================================================================
// ACCOUNT ERRORS
// =============================================================================

/// Errors from the Account Store.
#[derive(Debug, Error, Clone)]
pub enum AccountError {
    /// Lookup of an account that was never added.
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Contract path does not exist at account-creation time.
    #[error("missing contract image for {account}: {path}")]
    MissingContract {
        /// The account the image was declared for.
        account: AccountId,
        /// The path that did not resolve to an existing artifact.
        path: String,
    },

    /// A state blob could not be decoded into key/value form.
    #[error("malformed state blob for {0}: {1}")]
    MalformedState(AccountId, String),
}

// =============================================================================
// DRIVER ERRORS
// =============================================================================

/// Errors from invoking the external VM Driver.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    /// The driver subprocess could not be spawned.
    #[error("failed to launch VM driver: {0}")]
    VmLaunchFailed(String),

    /// The driver subprocess exited non-zero.
    #[error("VM driver crashed (exit status {status}): {stderr}")]
    VmCrashed {
        /// Process exit status, formatted.
        status: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The driver's stdout was not a well-formed outcome document.
    #[error("malformed VM driver outcome: {0}")]
    MalformedOutcome(String),
}

// =============================================================================
// SCHEDULER ERRORS
// =============================================================================

/// Fatal errors that abort the promise scheduler.
#[derive(Debug, Error, Clone)]
pub enum SchedulerError {
    /// Propagated account-store failure.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Propagated VM driver failure.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A receipt did not carry exactly one `FunctionCall` action.
    #[error("malformed receipt from {receiver}: expected exactly one FunctionCall action, got {action_count}")]
    MalformedReceipt {
        /// The receipt's declared receiver.
        receiver: AccountId,
        /// Number of actions actually present.
        action_count: usize,
    },
}
