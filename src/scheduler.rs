//! # Promise Scheduler
//!
//! Drives the transitive closure of receipts from a root contract
//! invocation to quiescence, maintaining the data-dependency graph, the
//! FIFO work queue, and the identification of the final return value.

use crate::config::SimulatorConfig;
use crate::domain::context::ContextOverride;
use crate::domain::outcome::{PromiseResult, ReturnData, StepResult};
use crate::domain::value_objects::{AccountId, Gas};
use crate::errors::SchedulerError;
use crate::ports::{AccountStore, VmDriver};
use crate::step::{CallRequest, StepExecutor};
use serde_json::Value as Json;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument, trace};

/// One pending or completed call, keyed by its global index.
///
/// Local receipt indices are rebased into global indices at ingest time
/// via `num_receipts` — this is the only sound way to keep indices
/// unique across an unknown-size expansion tree.
#[derive(Clone, Debug)]
pub struct CallDescriptor {
    /// Globally unique index for this call.
    pub index: u64,
    /// Account the call targets.
    pub account_id: AccountId,
    /// Method to invoke.
    pub method_name: String,
    /// Method arguments.
    pub input: String,
    /// Gas attached to this call.
    pub gas: Gas,
    /// Deposit attached to this call.
    pub deposit: u128,
    /// Inherited signer for the whole call chain.
    pub signer_account_id: AccountId,
    /// Immediate caller of this specific call.
    pub predecessor_account_id: AccountId,
    /// `data_id`s this call depends on, in order.
    pub input_data: Vec<u64>,
}

/// Where a completed call's result must be delivered.
#[derive(Clone, Debug)]
struct OutputTarget {
    receiver: AccountId,
    data_id: u64,
}

/// The final, caller-visible result of driving a root call to quiescence.
#[derive(Clone, Debug)]
pub struct CallOutcome {
    /// The root call's effective return value, JSON-decoded from the
    /// terminal step's `return_data.Value` payload if present.
    pub return_value: Option<Json>,
    /// The terminal step's contract-level error, if any.
    pub err: Option<String>,
    /// Every call descriptor that was ever enqueued, by global index.
    pub calls: HashMap<u64, CallDescriptor>,
    /// Every step result produced, by global index.
    pub results: HashMap<u64, StepResult>,
}

/// Drives a root invocation's full cross-contract call graph to
/// completion.
pub struct PromiseScheduler<'a> {
    config: &'a SimulatorConfig,
}

impl<'a> PromiseScheduler<'a> {
    /// Creates a scheduler bound to a simulator's configuration.
    #[must_use]
    pub fn new(config: &'a SimulatorConfig) -> Self {
        Self { config }
    }

    /// Drives `account_id.method_name(input)` and its entire receipt
    /// graph to completion.
    #[instrument(skip(self, store, driver, method_name, input, context_override), fields(account_id = %account_id))]
    pub fn call<S: AccountStore, D: VmDriver>(
        &self,
        store: &mut S,
        driver: &D,
        account_id: AccountId,
        method_name: impl Into<String>,
        input: impl Into<String>,
        context_override: ContextOverride,
    ) -> Result<CallOutcome, SchedulerError> {
        let method_name = method_name.into();
        let input = input.into();
        let executor = StepExecutor::new(self.config);

        let mut queue: VecDeque<CallDescriptor> = VecDeque::new();
        let mut calls: HashMap<u64, CallDescriptor> = HashMap::new();
        let mut results: HashMap<u64, StepResult> = HashMap::new();
        let mut all_input_data: HashMap<u64, PromiseResult> = HashMap::new();
        let mut all_output_data: HashMap<u64, Vec<OutputTarget>> = HashMap::new();
        let mut num_receipts: u64 = 1;
        let mut num_data: u64 = 0;
        let mut return_index: u64 = 0;

        let root_signer = context_override
            .signer_account_id
            .clone()
            .unwrap_or_else(|| account_id.clone());
        let root_predecessor = context_override
            .predecessor_account_id
            .clone()
            .unwrap_or_else(|| root_signer.clone());

        queue.push_back(CallDescriptor {
            index: 0,
            account_id,
            method_name,
            input,
            gas: Gas(context_override.prepaid_gas.unwrap_or(self.config.default_gas)),
            deposit: context_override.attached_deposit.unwrap_or(0),
            signer_account_id: root_signer,
            predecessor_account_id: root_predecessor,
            input_data: vec![],
        });

        while let Some(descriptor) = queue.pop_front() {
            // 1. Dependency gating.
            let resolved = match resolve_input_data(&descriptor.input_data, &all_input_data) {
                Some(resolved) => resolved,
                None => {
                    trace!(index = descriptor.index, "blocked on unresolved dependency, re-enqueuing");
                    queue.push_back(descriptor);
                    continue;
                }
            };

            // 2. Step execution.
            let output_data = all_output_data.remove(&descriptor.index).unwrap_or_default();
            let output_data_receivers = output_data.iter().map(|t| t.receiver.clone()).collect();
            debug!(index = descriptor.index, account_id = %descriptor.account_id, "executing step");

            let request = CallRequest {
                account_id: descriptor.account_id.clone(),
                method_name: descriptor.method_name.clone(),
                input: descriptor.input.clone(),
                is_view: false,
                context_override: ContextOverride {
                    signer_account_id: Some(descriptor.signer_account_id.clone()),
                    predecessor_account_id: Some(descriptor.predecessor_account_id.clone()),
                    prepaid_gas: Some(descriptor.gas.as_u64()),
                    attached_deposit: Some(descriptor.deposit),
                },
                input_data: resolved,
                output_data_receivers,
            };

            let step_result = executor.call_step(store, driver, request)?;
            let index = descriptor.index;
            calls.insert(index, descriptor.clone());

            // 3. Outcome dispatch.
            if step_result.outcome.failed() {
                for target in &output_data {
                    all_input_data.insert(target.data_id, PromiseResult::Failed);
                }
            } else {
                match &step_result.outcome.return_data {
                    ReturnData::Value(bytes) => {
                        for target in &output_data {
                            all_input_data
                                .insert(target.data_id, PromiseResult::Successful(bytes.clone()));
                        }
                    }
                    ReturnData::PlainString(_) | ReturnData::None => {
                        for target in &output_data {
                            all_input_data.insert(target.data_id, PromiseResult::Successful(vec![]));
                        }
                    }
                    ReturnData::ReceiptIndex(n) => {
                        let adjusted = n + num_receipts;
                        all_output_data
                            .entry(adjusted)
                            .or_default()
                            .extend(output_data.iter().cloned());
                        if return_index == index {
                            return_index = adjusted;
                        }
                    }
                }
            }

            // 4. Receipt expansion (success only).
            if !step_result.outcome.failed() {
                for (local_index, receipt) in step_result.receipts.iter().enumerate() {
                    let (method_name, args, gas, deposit) =
                        receipt.single_function_call().map_err(|action_count| {
                            SchedulerError::MalformedReceipt {
                                receiver: receipt.receiver_id.clone(),
                                action_count,
                            }
                        })?;

                    let mut input_data_ids = Vec::with_capacity(receipt.receipt_indices.len());
                    for dependency_local_index in &receipt.receipt_indices {
                        let data_id = num_data;
                        num_data += 1;
                        all_output_data
                            .entry(dependency_local_index + num_receipts)
                            .or_default()
                            .push(OutputTarget {
                                receiver: receipt.receiver_id.clone(),
                                data_id,
                            });
                        input_data_ids.push(data_id);
                    }

                    queue.push_back(CallDescriptor {
                        index: local_index as u64 + num_receipts,
                        account_id: receipt.receiver_id.clone(),
                        method_name: method_name.to_string(),
                        input: args.to_string(),
                        gas,
                        deposit,
                        signer_account_id: descriptor.signer_account_id.clone(),
                        predecessor_account_id: descriptor.account_id.clone(),
                        input_data: input_data_ids,
                    });
                }
                num_receipts += step_result.receipts.len() as u64;
            }

            results.insert(index, step_result);
        }

        let terminal = results.get(&return_index);
        let (return_value, err) = match terminal {
            Some(result) => (unwrap_return_value(&result.outcome.return_data), result.outcome.err.clone()),
            None => (None, None),
        };

        Ok(CallOutcome {
            return_value,
            err,
            calls,
            results,
        })
    }
}

/// Attempts to resolve every `data_id` a descriptor depends on, in
/// order. Returns `None` (meaning: still blocked) if any is missing.
fn resolve_input_data(
    data_ids: &[u64],
    all_input_data: &HashMap<u64, PromiseResult>,
) -> Option<Vec<PromiseResult>> {
    data_ids
        .iter()
        .map(|id| all_input_data.get(id).cloned())
        .collect()
}

/// Unwraps a terminal step's `return_data.Value` payload as JSON.
/// Plain-string and empty returns yield `None`.
fn unwrap_return_value(return_data: &ReturnData) -> Option<Json> {
    match return_data {
        ReturnData::Value(bytes) => Some(
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Json::String(String::from_utf8_lossy(bytes).into_owned())),
        ),
        ReturnData::PlainString(_) | ReturnData::None | ReturnData::ReceiptIndex(_) => None,
    }
}
