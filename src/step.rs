//! # Step Executor
//!
//! The single-call entry point: assembles a context, invokes the VM
//! Driver, and — for non-view, non-failed calls — commits the
//! resulting balance/state/storage back onto the callee account.

use crate::config::SimulatorConfig;
use crate::domain::account::decode_state;
use crate::domain::context::{ContextBuilder, ContextOverride};
use crate::domain::outcome::{PromiseResult, StepResult};
use crate::domain::value_objects::AccountId;
use crate::errors::SchedulerError;
use crate::ports::{AccountStore, VmDriver};
use tracing::{debug, instrument, warn};

/// Everything the Step Executor needs to run one call.
#[derive(Clone, Debug)]
pub struct CallRequest {
    /// Account the method executes against.
    pub account_id: AccountId,
    /// Method to invoke.
    pub method_name: String,
    /// Method arguments.
    pub input: String,
    /// Whether this is a side-effect-free view call.
    pub is_view: bool,
    /// Caller-supplied context overrides.
    pub context_override: ContextOverride,
    /// Resolved promise results for this call's dependencies, in order.
    pub input_data: Vec<PromiseResult>,
    /// Accounts awaiting this call's result.
    pub output_data_receivers: Vec<AccountId>,
}

/// Executes one contract method against one account.
pub struct StepExecutor<'a> {
    config: &'a SimulatorConfig,
}

impl<'a> StepExecutor<'a> {
    /// Creates a step executor bound to a simulator's configuration.
    #[must_use]
    pub fn new(config: &'a SimulatorConfig) -> Self {
        Self { config }
    }

    /// Executes `request` against `store` via `driver`, producing a
    /// [`StepResult`].
    ///
    /// Fails fatally with [`SchedulerError::Account`] if the callee (or
    /// an explicitly overridden signer) is unknown, before the driver is
    /// ever invoked. Fails fatally with [`SchedulerError::Driver`] if
    /// the driver can't be launched, exits non-zero, or writes an
    /// unparseable outcome.
    #[instrument(skip(self, store, driver, request), fields(account_id = %request.account_id, method = %request.method_name, is_view = request.is_view))]
    pub fn call_step<S: AccountStore, D: VmDriver>(
        &self,
        store: &mut S,
        driver: &D,
        request: CallRequest,
    ) -> Result<StepResult, SchedulerError> {
        // Confirm the callee exists before doing anything else — a step
        // against an unknown account is fatal prior to invoking the
        // driver.
        store.get(&request.account_id)?;

        let signer_account_id = request
            .context_override
            .signer_account_id
            .clone()
            .unwrap_or_else(|| request.account_id.clone());
        let signer_pk = store.get(&signer_account_id)?.signer_key.clone();

        let callee = store.get(&request.account_id)?;
        let context_builder = ContextBuilder::new(self.config);
        let context = context_builder.build(
            callee,
            request.input.clone(),
            request.input_data.clone(),
            request.output_data_receivers.clone(),
            request.is_view,
            &request.context_override,
            &signer_pk,
        );
        let contract_image = callee.contract_image.clone();
        let encoded_state = callee.encoded_state().to_string();

        debug!("invoking VM driver");
        let response = driver.invoke(
            &context,
            &request.method_name,
            &request.input,
            contract_image.as_deref(),
            &encoded_state,
            &request.input_data,
        )?;

        let decoded_state = decode_state(&response.state)
            .map_err(crate::errors::DriverError::MalformedOutcome)?;

        if response.outcome.failed() {
            warn!(error = ?response.outcome.err, "step reported a contract-level error");
        } else if !request.is_view {
            let account = store.get_mut(&request.account_id)?;
            account.balance = response.outcome.balance;
            account.storage_usage = response.outcome.storage_usage;
            account.set_encoded_state(response.state.clone());
        }

        Ok(StepResult {
            outcome: response.outcome,
            receipts: response.receipts,
            state: decoded_state,
        })
    }
}
