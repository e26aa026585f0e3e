//! # Process VM Driver
//!
//! Bridges the `VmDriver` port to the real external evaluator: a fresh
//! child process per step, invoked with named command-line arguments
//! and parsed from a single JSON document on stdout.

use crate::domain::context::VMContext;
use crate::domain::outcome::{Outcome, PromiseResult, Receipt};
use crate::errors::DriverError;
use crate::ports::{DriverResponse, VmDriver};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, instrument};

/// Invokes an external VM Driver binary as a blocking subprocess.
#[derive(Clone, Debug)]
pub struct ProcessVmDriver {
    /// Path to the driver executable.
    binary: PathBuf,
}

/// The `{outcome, receipts, state, err}` document the driver writes to
/// stdout. `err` duplicates `outcome.err` as a top-level convenience;
/// when the outcome itself doesn't carry one, the top-level value is
/// adopted.
#[derive(Deserialize)]
struct DriverOutputDoc {
    outcome: Outcome,
    receipts: Vec<Receipt>,
    state: String,
    err: Option<String>,
}

impl ProcessVmDriver {
    /// Creates a driver bound to the given binary path.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl VmDriver for ProcessVmDriver {
    #[instrument(skip(self, context, state, promise_results), fields(method_name))]
    fn invoke(
        &self,
        context: &VMContext,
        method_name: &str,
        input: &str,
        wasm_file: Option<&Path>,
        state: &str,
        promise_results: &[PromiseResult],
    ) -> Result<DriverResponse, DriverError> {
        let context_json = serde_json::to_string(context)
            .map_err(|e| DriverError::VmLaunchFailed(format!("failed to encode context: {e}")))?;

        let mut command = Command::new(&self.binary);
        command
            .arg("--context")
            .arg(&context_json)
            .arg("--input")
            .arg(input)
            .arg("--method-name")
            .arg(method_name)
            .arg("--state")
            .arg(state);

        if let Some(path) = wasm_file {
            command.arg("--wasm-file").arg(path);
        }

        for result in promise_results {
            let encoded = serde_json::to_string(result).map_err(|e| {
                DriverError::VmLaunchFailed(format!("failed to encode promise result: {e}"))
            })?;
            command.arg("--promise-results").arg(encoded);
        }

        debug!(binary = %self.binary.display(), "launching VM driver");
        let output = command
            .output()
            .map_err(|e| DriverError::VmLaunchFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(DriverError::VmCrashed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let mut doc: DriverOutputDoc = serde_json::from_slice(&output.stdout)
            .map_err(|e| DriverError::MalformedOutcome(e.to_string()))?;
        if doc.outcome.err.is_none() {
            doc.outcome.err = doc.err;
        }

        Ok(DriverResponse {
            outcome: doc.outcome,
            receipts: doc.receipts,
            state: doc.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_failure_surfaces_as_vm_launch_failed() {
        let driver = ProcessVmDriver::new("/no/such/vm-driver-binary");
        let context = VMContext {
            current_account_id: "alice".into(),
            signer_account_id: "alice".into(),
            signer_account_pk: String::new(),
            predecessor_account_id: "alice".into(),
            input: "{}".into(),
            input_data: vec![],
            output_data_receivers: vec![],
            prepaid_gas: 0,
            attached_deposit: 0,
            account_balance: 0,
            account_locked_balance: 0,
            storage_usage: 0,
            is_view: true,
            block_height: 0,
            block_timestamp: 0,
        };
        let err = driver
            .invoke(&context, "echo", "{}", None, "{}", &[])
            .unwrap_err();
        assert!(matches!(err, DriverError::VmLaunchFailed(_)));
    }
}
