//! # VM Driver Outcome Types
//!
//! `Outcome`/`Receipt`/`PromiseResult` mirror the JSON schema the VM
//! Driver is contractually required to emit. `ReturnData` and
//! `PromiseResult` carry custom (de)serialization because the wire shape
//! is a small tagged union that a derive can't express directly — in
//! particular `ReturnData` must accept a bare JSON string as a distinct
//! case from a tagged `Value`.

use crate::domain::account::DecodedState;
use crate::domain::value_objects::{AccountId, Gas};
use base64::Engine;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

// =============================================================================
// RETURN DATA
// =============================================================================

/// The shape of a step's return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnData {
    /// No return value.
    None,
    /// A tagged byte payload.
    Value(Vec<u8>),
    /// A bare string return, treated as logging-only: its *payload* is
    /// discarded and it materializes as an empty `Successful` promise
    /// result, distinct from `Value(vec![])`.
    PlainString(String),
    /// "My real answer is whatever receipt N returns" — the callback
    /// primitive driving `return_index` forwarding.
    ReceiptIndex(u64),
}

impl Serialize for ReturnData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReturnData::None => serializer.serialize_none(),
            ReturnData::PlainString(s) => serializer.serialize_str(s),
            ReturnData::Value(bytes) => {
                let mut obj = serde_json::Map::new();
                obj.insert(
                    "Value".to_string(),
                    Json::String(base64::engine::general_purpose::STANDARD.encode(bytes)),
                );
                Json::Object(obj).serialize(serializer)
            }
            ReturnData::ReceiptIndex(n) => {
                let mut obj = serde_json::Map::new();
                obj.insert("ReceiptIndex".to_string(), Json::from(*n));
                Json::Object(obj).serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for ReturnData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        match value {
            Json::Null => Ok(ReturnData::None),
            Json::String(s) => Ok(ReturnData::PlainString(s)),
            Json::Object(map) => {
                if let Some(v) = map.get("Value") {
                    let b64 = v
                        .as_str()
                        .ok_or_else(|| de::Error::custom("Value must be a base64 string"))?;
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(b64)
                        .map_err(de::Error::custom)?;
                    Ok(ReturnData::Value(bytes))
                } else if let Some(v) = map.get("ReceiptIndex") {
                    let n = v
                        .as_u64()
                        .ok_or_else(|| de::Error::custom("ReceiptIndex must be a u64"))?;
                    Ok(ReturnData::ReceiptIndex(n))
                } else {
                    Err(de::Error::custom("unrecognized return_data object shape"))
                }
            }
            other => Err(de::Error::custom(format!(
                "unsupported return_data JSON value: {other}"
            ))),
        }
    }
}

// =============================================================================
// PROMISE RESULT
// =============================================================================

/// The materialized outcome of a prior receipt, delivered to a dependent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromiseResult {
    /// The upstream call succeeded; carries its return bytes (empty for a
    /// plain-string or no-value return).
    Successful(Vec<u8>),
    /// The upstream call failed or its dependency chain failed.
    Failed,
}

impl Serialize for PromiseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut obj = serde_json::Map::new();
        match self {
            PromiseResult::Successful(bytes) => {
                obj.insert(
                    "Successful".to_string(),
                    Json::String(base64::engine::general_purpose::STANDARD.encode(bytes)),
                );
            }
            PromiseResult::Failed => {
                obj.insert("Failed".to_string(), Json::Null);
            }
        }
        Json::Object(obj).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PromiseResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        match value {
            Json::Object(map) if map.contains_key("Successful") => {
                let b64 = map["Successful"]
                    .as_str()
                    .ok_or_else(|| de::Error::custom("Successful must be a base64 string"))?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(b64)
                    .map_err(de::Error::custom)?;
                Ok(PromiseResult::Successful(bytes))
            }
            Json::Object(map) if map.contains_key("Failed") => Ok(PromiseResult::Failed),
            Json::String(s) if s == "Failed" => Ok(PromiseResult::Failed),
            other => Err(de::Error::custom(format!(
                "unrecognized promise_result JSON value: {other}"
            ))),
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Everything the VM Driver returns for a single step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Outcome {
    /// Ordered log lines emitted during execution.
    pub logs: Vec<String>,
    /// Callee balance after the call.
    pub balance: u128,
    /// Callee storage usage after the call.
    pub storage_usage: u64,
    /// The call's return value.
    pub return_data: ReturnData,
    /// Contract-level error, if the method aborted. Not fatal to the
    /// scheduler: it is data that flows to dependents as `Failed`.
    pub err: Option<String>,
}

impl Outcome {
    /// True if the VM reported a contract-level error for this step.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.err.is_some()
    }
}

// =============================================================================
// RECEIPT / ACTION
// =============================================================================

/// A single action carried by a receipt.
///
/// The VM Driver is only ever allowed to emit `FunctionCall` actions in
/// this simulator; any other shape is a driver contract violation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Invoke a method on the receipt's receiver.
    FunctionCall {
        /// Method to invoke.
        method_name: String,
        /// Method arguments.
        args: String,
        /// Gas attached to the call.
        gas: Gas,
        /// Deposit attached to the call.
        deposit: u128,
    },
    /// Any other action kind. Never valid here; exists so a driver
    /// contract violation deserializes instead of failing to parse.
    #[serde(other)]
    Other,
}

/// A deferred contract call emitted as a side effect of a step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt {
    /// The account the new call targets.
    pub receiver_id: AccountId,
    /// Local indices (within this outcome's receipt list) of the
    /// receiver's data-dependencies.
    pub receipt_indices: Vec<u64>,
    /// This receipt's actions. Must contain exactly one `FunctionCall`.
    pub actions: Vec<Action>,
}

impl Receipt {
    /// Returns the receipt's sole `FunctionCall` action, or `Err` with
    /// the actual action count if the invariant doesn't hold.
    pub fn single_function_call(&self) -> Result<(&str, &str, Gas, u128), usize> {
        if self.actions.len() != 1 {
            return Err(self.actions.len());
        }
        match &self.actions[0] {
            Action::FunctionCall {
                method_name,
                args,
                gas,
                deposit,
            } => Ok((method_name.as_str(), args.as_str(), *gas, *deposit)),
            Action::Other => Err(1),
        }
    }
}

// =============================================================================
// STEP RESULT
// =============================================================================

/// The immutable result of executing one step: outcome, emitted
/// receipts, and the callee's decoded post-state (for observers; the
/// encoded form is what actually gets committed to the Account Store).
#[derive(Clone, Debug)]
pub struct StepResult {
    /// The driver's reported outcome.
    pub outcome: Outcome,
    /// Receipts emitted by this step, in emitted order.
    pub receipts: Vec<Receipt>,
    /// Decoded post-state, for observers.
    pub state: DecodedState,
}
