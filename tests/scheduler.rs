//! End-to-end scheduler scenarios, driven against a fake VM Driver
//! double instead of a real subprocess. Covers the six worked scenarios
//! plus the invariants they exercise.

use promise_sim::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Scripts one `DriverResponse` per `(account_id, method_name)` pair,
/// and records every invocation it served for post-hoc assertions.
struct ScriptedDriver {
    responses: RefCell<HashMap<(String, String), Vec<DriverResponse>>>,
    invocations: RefCell<Vec<(String, String, Vec<PromiseResult>)>>,
}

impl ScriptedDriver {
    fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            invocations: RefCell::new(vec![]),
        }
    }

    /// Queues one response for `(account_id, method)`; repeated calls
    /// to the same key are served in queued order.
    fn on(self, account_id: &str, method: &str, response: DriverResponse) -> Self {
        self.responses
            .borrow_mut()
            .entry((account_id.to_string(), method.to_string()))
            .or_default()
            .push(response);
        self
    }
}

impl VmDriver for ScriptedDriver {
    fn invoke(
        &self,
        context: &VMContext,
        method_name: &str,
        _input: &str,
        _wasm_file: Option<&Path>,
        state: &str,
        promise_results: &[PromiseResult],
    ) -> Result<DriverResponse, promise_sim::errors::DriverError> {
        let key = (context.current_account_id.to_string(), method_name.to_string());
        self.invocations
            .borrow_mut()
            .push((key.0.clone(), key.1.clone(), promise_results.to_vec()));
        let mut responses = self.responses.borrow_mut();
        let queued = responses
            .get_mut(&key)
            .unwrap_or_else(|| panic!("no scripted response for {key:?}"));
        let mut response = if queued.len() > 1 {
            queued.remove(0)
        } else {
            queued[0].clone()
        };
        response.state = if response.state.is_empty() {
            state.to_string()
        } else {
            response.state
        };
        Ok(response)
    }
}

fn empty_state() -> String {
    promise_sim::domain::account::encode_state(&Default::default())
}

fn ok(return_data: ReturnData) -> Outcome {
    Outcome {
        logs: vec![],
        balance: 1,
        storage_usage: 60,
        return_data,
        err: None,
    }
}

fn failed() -> Outcome {
    Outcome {
        logs: vec![],
        balance: 1,
        storage_usage: 60,
        return_data: ReturnData::None,
        err: Some("method aborted".into()),
    }
}

fn single_call_receipt(receiver: &str, args: &str, depends_on: Vec<u64>) -> Receipt {
    Receipt {
        receiver_id: AccountId::new(receiver),
        receipt_indices: depends_on,
        actions: vec![Action::FunctionCall {
            method_name: "handle".into(),
            args: args.into(),
            gas: Gas(1),
            deposit: 0,
        }],
    }
}

fn simulator_with(driver: ScriptedDriver, accounts: &[&str]) -> Simulator<InMemoryAccountStore, ScriptedDriver> {
    let mut sim = Simulator::with_parts(SimulatorConfig::default(), InMemoryAccountStore::new(), driver);
    for id in accounts {
        sim.new_account(*id, None).unwrap();
    }
    sim
}

#[test]
fn test_direct_value_return_yields_decoded_json() {
    let driver = ScriptedDriver::new().on(
        "alice",
        "echo",
        DriverResponse {
            outcome: ok(ReturnData::Value(
                serde_json::to_vec(&serde_json::json!({"x": 7})).unwrap(),
            )),
            receipts: vec![],
            state: empty_state(),
        },
    );
    let mut sim = simulator_with(driver, &["alice"]);
    let mut alice = sim.get_account("alice");
    let before = alice.view("echo", "{\"x\":7}").unwrap();
    assert_eq!(
        before.return_data,
        ReturnData::Value(serde_json::to_vec(&serde_json::json!({"x": 7})).unwrap())
    );
    assert!(before.err.is_none());
}

#[test]
fn test_balance_decreases_across_successive_mutating_calls() {
    let driver = ScriptedDriver::new()
        .on(
            "alice",
            "inc",
            DriverResponse {
                outcome: Outcome { balance: 1_000, ..ok(ReturnData::None) },
                receipts: vec![],
                state: {
                    let mut s = promise_sim::domain::account::DecodedState::new();
                    s.insert("counter".into(), b"1".to_vec());
                    promise_sim::domain::account::encode_state(&s)
                },
            },
        )
        .on(
            "alice",
            "inc",
            DriverResponse {
                outcome: Outcome { balance: 500, ..ok(ReturnData::None) },
                receipts: vec![],
                state: {
                    let mut s = promise_sim::domain::account::DecodedState::new();
                    s.insert("counter".into(), b"2".to_vec());
                    promise_sim::domain::account::encode_state(&s)
                },
            },
        )
        .on(
            "alice",
            "get",
            DriverResponse {
                outcome: ok(ReturnData::Value(b"1".to_vec())),
                receipts: vec![],
                state: String::new(),
            },
        )
        .on(
            "alice",
            "get",
            DriverResponse {
                outcome: ok(ReturnData::Value(b"2".to_vec())),
                receipts: vec![],
                state: String::new(),
            },
        );

    let mut sim = simulator_with(driver, &["alice"]);
    let alice_id = AccountId::new("alice");
    let mut alice = sim.get_account("alice");

    let first_call = alice.call("inc", "{}").unwrap();
    assert!(first_call.err.is_none());
    let first_view = alice.view("get", "{}").unwrap();
    assert_eq!(first_view.return_data, ReturnData::Value(b"1".to_vec()));
    let balance_after_first = sim.inspect_account(&alice_id).unwrap().balance;

    let mut alice = sim.get_account("alice");
    alice.call("inc", "{}").unwrap();
    let second_view = alice.view("get", "{}").unwrap();
    assert_eq!(second_view.return_data, ReturnData::Value(b"2".to_vec()));
    let balance_after_second = sim.inspect_account(&alice_id).unwrap().balance;

    assert!(balance_after_second < balance_after_first);
}

#[test]
fn test_single_cross_contract_forward_advances_return_index() {
    let driver = ScriptedDriver::new()
        .on(
            "alice",
            "forward_to_bob",
            DriverResponse {
                outcome: ok(ReturnData::ReceiptIndex(0)),
                receipts: vec![single_call_receipt("bob", "{\"n\":3}", vec![])],
                state: empty_state(),
            },
        )
        .on(
            "bob",
            "handle",
            DriverResponse {
                outcome: ok(ReturnData::Value(b"6".to_vec())),
                receipts: vec![],
                state: empty_state(),
            },
        );

    let mut sim = simulator_with(driver, &["alice", "bob"]);
    let mut alice = sim.get_account("alice");
    let result = alice.call("forward_to_bob", "{\"n\":3}").unwrap();

    assert_eq!(result.return_value, Some(serde_json::json!(6)));
    assert_eq!(result.calls.len(), 2);
    assert!(result.calls.contains_key(&0));
    assert!(result.calls.contains_key(&1));
}

#[test]
fn test_fan_in_join_delivers_mixed_results_in_order() {
    struct JoinDriver {
        seen: RefCell<Vec<PromiseResult>>,
    }
    impl VmDriver for JoinDriver {
        fn invoke(
            &self,
            context: &VMContext,
            method_name: &str,
            _input: &str,
            _wasm_file: Option<&Path>,
            _state: &str,
            promise_results: &[PromiseResult],
        ) -> Result<DriverResponse, promise_sim::errors::DriverError> {
            match (context.current_account_id.as_str(), method_name) {
                ("alice", "fan") => Ok(DriverResponse {
                    outcome: ok(ReturnData::ReceiptIndex(2)),
                    receipts: vec![
                        single_call_receipt("left", "{}", vec![]),
                        single_call_receipt("right", "{}", vec![]),
                        single_call_receipt("joiner", "{}", vec![0, 1]),
                    ],
                    state: empty_state(),
                }),
                ("left", "handle") => Ok(DriverResponse {
                    outcome: ok(ReturnData::Value(b"\"left-ok\"".to_vec())),
                    receipts: vec![],
                    state: empty_state(),
                }),
                ("right", "handle") => Ok(DriverResponse {
                    outcome: failed(),
                    receipts: vec![],
                    state: empty_state(),
                }),
                ("joiner", "handle") => {
                    *self.seen.borrow_mut() = promise_results.to_vec();
                    Ok(DriverResponse {
                        outcome: ok(ReturnData::Value(b"\"joined\"".to_vec())),
                        receipts: vec![],
                        state: empty_state(),
                    })
                }
                other => panic!("unexpected call {other:?}"),
            }
        }
    }

    let driver = JoinDriver { seen: RefCell::new(vec![]) };
    let mut sim = Simulator::with_parts(SimulatorConfig::default(), InMemoryAccountStore::new(), driver);
    for id in ["alice", "left", "right", "joiner"] {
        sim.new_account(id, None).unwrap();
    }

    let mut alice = sim.get_account("alice");
    let result = alice.call("fan", "{}").unwrap();

    assert_eq!(result.return_value, Some(serde_json::json!("joined")));
    assert_eq!(result.calls.len(), 4);
}

#[test]
fn test_contract_error_does_not_abort_the_scheduler() {
    let driver = ScriptedDriver::new()
        .on(
            "alice",
            "root",
            DriverResponse {
                outcome: ok(ReturnData::None),
                receipts: vec![single_call_receipt("bob", "{}", vec![])],
                state: empty_state(),
            },
        )
        .on(
            "bob",
            "handle",
            DriverResponse {
                outcome: failed(),
                receipts: vec![],
                state: empty_state(),
            },
        );

    let mut sim = simulator_with(driver, &["alice", "bob"]);
    let mut alice = sim.get_account("alice");
    let result = alice.call("root", "{}").unwrap();

    assert_eq!(result.calls.len(), 2);
    assert_eq!(result.results.len(), 2);
    assert!(result.results[&1].outcome.err.is_some());
}

#[test]
fn test_unknown_account_is_fatal_before_invoking_driver() {
    let driver = ScriptedDriver::new();
    let config = SimulatorConfig::default();
    let mut store = InMemoryAccountStore::new();
    let executor = StepExecutor::new(&config);

    let request = CallRequest {
        account_id: AccountId::new("ghost"),
        method_name: "echo".into(),
        input: "{}".into(),
        is_view: true,
        context_override: ContextOverride::default(),
        input_data: vec![],
        output_data_receivers: vec![],
    };

    let err = executor.call_step(&mut store, &driver, request).unwrap_err();
    assert!(matches!(err, SchedulerError::Account(AccountError::UnknownAccount(_))));
    assert!(driver.invocations.borrow().is_empty());
}
