//! Tests for the substitute module.
//!
//! This module contains tests for:
//! - Property assignment and configured property values
//! - Configured returns for calls (literals, matchers, sequences, async)
//! - Received / did-not-receive assertions and their messages
//! - Dispatcher state handling, probes and errors

use super::*;
use crate::argument::Argument;
use crate::config::SubstituteConfig;
use crate::error::SubstituteError;
use crate::matcher::Arg;
use crate::value::Value;
use crate::args;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_test::traced_test;

fn sub() -> Substitute {
    Substitute::new()
}

fn assertion_message(err: SubstituteError) -> String {
    assert!(err.is_assertion(), "expected an assertion error, got {err:?}");
    err.to_string()
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_set_and_get_property() {
    let sub = sub();
    sub.set("numberProp", 1);

    assert_eq!(sub.get("numberProp").value(), Value::from(1));
}

#[test]
fn test_unknown_property_yields_root() {
    let sub = sub();
    let access = sub.get("numberProp");

    assert!(!access.is_value());
    assert!(access.clone().into_root().is_some());
    assert!(access.value().is_undefined());
}

#[test]
fn test_configure_property_return() {
    let sub = sub();
    sub.get("numberProp").returns(args![5]).unwrap();

    assert_eq!(sub.get("numberProp").value(), Value::from(5));
    assert_eq!(sub.get("numberProp").value(), Value::from(5));
}

#[test]
fn test_configure_property_sequence_stops_on_last() {
    let sub = sub();
    sub.get("numberProp").returns(args![5, 6]).unwrap();

    assert_eq!(sub.get("numberProp").value(), Value::from(5));
    assert_eq!(sub.get("numberProp").value(), Value::from(6));
    assert_eq!(sub.get("numberProp").value(), Value::from(6));
}

#[test]
fn test_assignment_replaces_configured_property() {
    let sub = sub();
    sub.get("numberProp").returns(args![5]).unwrap();
    sub.set("numberProp", 9);

    assert_eq!(sub.get("numberProp").value(), Value::from(9));
}

#[test]
fn test_configured_property_cannot_be_reconfigured_through_value() {
    let sub = sub();
    sub.get("numberProp").returns(args![5]).unwrap();

    let err = sub.get("numberProp").returns(args![6]).unwrap_err();
    assert_eq!(err, SubstituteError::NotConfigurable("{Number:5}".to_string()));
}

#[test]
fn test_returns_async_on_property_wraps_values() {
    let sub = sub();
    sub.get("pending").returns_async(args!["done"]).unwrap();

    match sub.get("pending").value() {
        Value::Deferred(deferred) => assert_eq!(deferred.value(), &Value::from("done")),
        other => panic!("expected a deferred value, got {other:?}"),
    }
}

// ============================================================================
// Configured returns for calls
// ============================================================================

#[test]
fn test_return_for_literal_arguments() {
    let sub = sub();
    sub.call("stringMethod", args!["something", 1])
        .returns(args!["returned"])
        .unwrap();

    assert_eq!(
        sub.call("stringMethod", args!["something", 1]).value(),
        Value::from("returned")
    );
}

#[test]
fn test_unmatched_call_yields_companion() {
    let sub = sub();
    sub.call("stringMethod", args!["something", 1])
        .returns(args!["returned"])
        .unwrap();

    let access = sub.call("stringMethod", args!["other", 1]);
    assert!(access.clone().into_companion().is_some());
    assert!(access.value().is_undefined());
}

#[test]
fn test_return_using_any_matcher() {
    let sub = sub();
    sub.call("stringMethod", args![Arg::any_of("String"), 1])
        .returns(args!["returned"])
        .unwrap();

    assert_eq!(
        sub.call("stringMethod", args!["something", 1]).value(),
        Value::from("returned")
    );
    assert!(sub.call("stringMethod", args![3, 1]).value().is_undefined());
}

#[test]
fn test_return_using_is_matcher() {
    let sub = sub();
    let below_five = Arg::is(|a: &Argument| a.original_value().as_f64().is_some_and(|n| n < 5.0));
    sub.call("stringMethod", args![Arg::any_of("String"), below_five])
        .returns(args!["returned"])
        .unwrap();

    assert_eq!(
        sub.call("stringMethod", args!["something", 1]).value(),
        Value::from("returned")
    );
    assert!(sub
        .call("stringMethod", args!["something", 7])
        .value()
        .is_undefined());
}

#[test]
fn test_returns_for_different_arguments() {
    let sub = sub();
    sub.call("stringMethod", args!["one", 1])
        .returns(args!["ONE"])
        .unwrap();
    sub.call("stringMethod", args!["two", 2])
        .returns(args!["TWO"])
        .unwrap();

    assert_eq!(sub.call("stringMethod", args!["one", 1]).value(), Value::from("ONE"));
    assert_eq!(sub.call("stringMethod", args!["two", 2]).value(), Value::from("TWO"));
}

#[test]
fn test_return_sequence_stops_on_last() {
    let sub = sub();
    sub.call("stringMethod", args!["one", 1])
        .returns(args!["ONE", "TWO"])
        .unwrap();

    for expected in ["ONE", "TWO", "TWO"] {
        assert_eq!(
            sub.call("stringMethod", args!["one", 1]).value(),
            Value::from(expected)
        );
    }
}

#[test]
fn test_first_configured_setup_wins() {
    let sub = sub();
    sub.call("lookup", args!["specific"])
        .returns(args!["specific"])
        .unwrap();
    sub.call("lookup", args![Arg::any()])
        .returns(args!["general"])
        .unwrap();

    assert_eq!(
        sub.call("lookup", args!["specific"]).value(),
        Value::from("specific")
    );
    assert_eq!(
        sub.call("lookup", args!["other"]).value(),
        Value::from("general")
    );
}

#[test]
fn test_configuration_call_is_not_recorded() {
    let sub = sub();
    sub.call("stringMethod", args!["one", 1])
        .returns(args!["ONE"])
        .unwrap();

    let summary = sub.ledger("stringMethod").unwrap();
    assert!(summary.calls.is_empty());
    assert_eq!(summary.return_setup_count, 1);
}

#[tokio::test]
async fn test_returns_async_for_call() {
    let sub = sub();
    sub.call("asyncMethod", args![1, "something"])
        .returns_async(args![true])
        .unwrap();

    let deferred = sub
        .call("asyncMethod", args![1, "something"])
        .value()
        .as_deferred()
        .cloned()
        .unwrap();
    assert_eq!(deferred.await, Value::from(true));
}

#[tokio::test]
async fn test_returns_async_sequence_stops_on_last() {
    let sub = sub();
    sub.call("asyncMethod", args![1, "one"])
        .returns_async(args![true, false])
        .unwrap();

    for expected in [true, false, false] {
        let value = sub.call("asyncMethod", args![1, "one"]).value();
        let deferred = value.as_deferred().cloned().unwrap();
        assert_eq!(deferred.await, Value::from(expected));
    }
}

#[test]
fn test_and_does_runs_action_with_call_arguments() {
    let sub = sub();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();

    sub.call("save", args![Arg::any()])
        .and_does(move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from(args.len())
        })
        .unwrap();

    assert_eq!(sub.call("save", args!["a"]).value(), Value::from(1));
    assert_eq!(sub.call("save", args!["b"]).value(), Value::from(1));
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_and_does_action_can_use_the_substitute() {
    let sub = sub();
    let inner = sub.clone();
    sub.call("save", args![Arg::any()])
        .and_does(move |args| {
            inner.set("lastSaved", args[0].clone());
            Value::Undefined
        })
        .unwrap();

    sub.call("save", args!["record"]);
    assert_eq!(sub.get("lastSaved").value(), Value::from("record"));
}

#[test]
fn test_and_does_rejects_non_function() {
    let sub = sub();
    sub.call("save", args![1]);

    let err = sub.and_does().invoke(args![42]).unwrap_err();
    assert_eq!(err, SubstituteError::NotCallable("{Number:42}".to_string()));
}

#[test]
fn test_function_property_is_called() {
    let sub = sub();
    sub.set("callback", Value::function(|args| Value::from(args.len() * 2)));

    assert_eq!(sub.call("callback", args![1, 2]).value(), Value::from(4));
    assert!(sub.ledger("callback").unwrap().calls.is_empty());
}

#[test]
fn test_callable_root() {
    let sub = sub();
    sub.get("handler");
    sub.invoke(args![1]).returns(args!["handled"]).unwrap();

    assert_eq!(sub.invoke(args![1]).value(), Value::from("handled"));
    sub.received().invoke(args![1]).unwrap();
}

// ============================================================================
// Assignment assertions
// ============================================================================

#[test]
fn test_received_assignment() {
    let sub = sub();
    sub.set("numberProp", 1);

    sub.received().set("numberProp", 1).unwrap();
}

#[test]
fn test_received_assignment_failure_message() {
    let sub = sub();
    sub.set("numberProp", 2);

    let err = sub.received_times(1).set("numberProp", 1).unwrap_err();
    assert_eq!(
        assertion_message(err),
        "Expected numberProp to have been assigned the value 1, 1 time/s.\nActual assignments were: [ 2 ]"
    );
}

#[test]
fn test_received_assignment_count_is_exact() {
    let sub = sub();
    sub.set("numberProp", 1);
    sub.set("numberProp", 1);

    assert!(sub.received().set("numberProp", 1).is_err());
    sub.received_times(2).set("numberProp", 1).unwrap();
}

#[test]
fn test_did_not_receive_assignment() {
    let sub = sub();
    sub.set("numberProp", 1);

    sub.did_not_receive().set("numberProp", 2).unwrap();
}

#[test]
fn test_did_not_receive_assignment_failure_message() {
    let sub = sub();
    sub.set("stringProp", "something");

    let err = sub
        .did_not_receive()
        .set("stringProp", "something")
        .unwrap_err();
    assert_eq!(
        assertion_message(err),
        "Expected stringProp not to have been assigned the value something, 1 time/s.\nActual assignments were: [ something ]"
    );
}

#[test]
fn test_did_not_receive_assignment_with_count() {
    let sub = sub();
    sub.set("numberProp", 1);
    sub.set("numberProp", 1);

    sub.did_not_receive_times(1).set("numberProp", 1).unwrap();
    assert!(sub.did_not_receive_times(2).set("numberProp", 1).is_err());
}

#[test]
fn test_received_with_any_args_assignment() {
    let sub = sub();
    sub.set("numberProp", 1);
    sub.set("numberProp", 2);

    sub.received_with_any_args_times(2)
        .set("numberProp", Value::Undefined)
        .unwrap();
    assert!(sub
        .received_with_any_args_times(3)
        .set("numberProp", Value::Undefined)
        .is_err());
}

// ============================================================================
// Call assertions
// ============================================================================

#[test]
fn test_received_call_without_arguments() {
    let sub = sub();
    sub.call("voidMethod", args![]);

    sub.received().call("voidMethod", args![]).unwrap();
}

#[test]
fn test_received_call_without_arguments_never_called() {
    let sub = sub();

    let err = sub.received().call("voidMethod", args![]).unwrap_err();
    assert_eq!(
        assertion_message(err),
        "Expected voidMethod to have been called 1 time/s, but this method was never called."
    );
}

#[test]
fn test_received_call_with_values() {
    let sub = sub();
    sub.call("voidMethodWithArg", args!["something"]);

    sub.received()
        .call("voidMethodWithArg", args!["something"])
        .unwrap();
}

#[test]
fn test_received_call_with_values_never_called() {
    let sub = sub();

    let err = sub
        .received()
        .call("voidMethodWithArg", args!["something"])
        .unwrap_err();
    assert_eq!(
        assertion_message(err),
        "Expected voidMethodWithArg to have been called 1 time/s, but this method was never called."
    );
}

#[test]
fn test_received_call_with_any_matcher() {
    let sub = sub();
    sub.call("voidMethodWithArg", args!["something"]);

    sub.received()
        .call("voidMethodWithArg", args![Arg::any_of("String")])
        .unwrap();
}

#[test]
fn test_received_call_with_any_matcher_failure_message() {
    let sub = sub();
    sub.call("voidMethodWithArg", args!["something"]);

    let err = sub
        .received()
        .call("voidMethodWithArg", args![Arg::any_of("Number")])
        .unwrap_err();
    assert_eq!(
        assertion_message(err),
        "Expected voidMethodWithArg to have been called 1 time/s, but no matching call was received.\nLast Call:\n[ {String:something} ]\nAll Calls:\n[ {String:something} ]"
    );
}

#[test]
fn test_received_call_with_is_matcher() {
    let sub = sub();
    sub.call("voidMethodWithArg", args!["something"]);

    sub.received()
        .call(
            "voidMethodWithArg",
            args![Arg::is(|a: &Argument| a.original_value() == &Value::from("something"))],
        )
        .unwrap();

    let err = sub
        .received()
        .call(
            "voidMethodWithArg",
            args![Arg::is(|a: &Argument| a.original_value() == &Value::from("something else"))],
        )
        .unwrap_err();
    assert_eq!(
        assertion_message(err),
        "Expected voidMethodWithArg to have been called 1 time/s, but no matching call was received.\nLast Call:\n[ {String:something} ]\nAll Calls:\n[ {String:something} ]"
    );
}

#[test]
fn test_received_times_is_a_minimum() {
    let sub = sub();
    for _ in 0..3 {
        sub.call("ping", args!["host"]);
    }

    sub.received_times(2).call("ping", args!["host"]).unwrap();
    sub.received_times(3).call("ping", args!["host"]).unwrap();
    assert!(sub.received_times(4).call("ping", args!["host"]).is_err());
}

#[test]
fn test_did_not_receive_call() {
    let sub = sub();
    sub.call("ping", args!["host"]);

    sub.did_not_receive().call("ping", args!["other"]).unwrap();

    let err = sub.did_not_receive().call("ping", args!["host"]).unwrap_err();
    assert_eq!(err.member(), Some("ping"));
    assert!(err.to_string().contains("All Calls:\n[ {String:host} ]"));
}

#[test]
fn test_did_not_receive_zero_argument_call_is_a_minimum() {
    let sub = sub();
    sub.did_not_receive().call("voidMethod", args![]).unwrap();

    sub.call("voidMethod", args![]);
    sub.call("voidMethod", args![]);

    let err = sub
        .did_not_receive()
        .call("voidMethod", args![])
        .unwrap_err();
    assert_eq!(err.member(), Some("voidMethod"));
    assert!(sub
        .did_not_receive_times(2)
        .call("voidMethod", args![])
        .is_err());
    sub.did_not_receive_times(3)
        .call("voidMethod", args![])
        .unwrap();
}

#[test]
fn test_did_not_receive_zero_argument_ignores_calls_with_arguments() {
    let sub = sub();
    sub.call("voidMethod", args![1]);

    sub.did_not_receive().call("voidMethod", args![]).unwrap();
}

#[test]
fn test_received_with_any_args() {
    let sub = sub();
    sub.call("ping", args!["a"]);
    sub.call("ping", args![1, 2]);

    sub.received_with_any_args().call("ping", args![]).unwrap();
    sub.received_with_any_args_times(2)
        .call("ping", args![])
        .unwrap();

    let err = sub
        .received_with_any_args_times(3)
        .call("ping", args![])
        .unwrap_err();
    assert!(err.is_assertion());
}

#[test]
fn test_did_not_receive_with_any_args() {
    let sub = sub();
    sub.did_not_receive_with_any_args()
        .call("ping", args![])
        .unwrap();

    sub.call("ping", args!["a"]);
    assert!(sub
        .did_not_receive_with_any_args()
        .call("ping", args![])
        .is_err());
}

#[test]
fn test_assertion_does_not_record_call() {
    let sub = sub();
    sub.call("ping", args!["a"]);
    sub.received().call("ping", args!["a"]).unwrap();

    assert_eq!(sub.ledger("ping").unwrap().calls.len(), 1);
}

// ============================================================================
// Dispatcher state
// ============================================================================

#[test]
fn test_reserved_names_read_through_get() {
    let sub = sub();
    sub.call("ping", args!["a"]);

    let companion = sub.get("received").into_companion().unwrap();
    companion.call("ping", args!["a"]).unwrap();
}

#[test]
fn test_pending_state_is_discarded_by_root_access() {
    let sub = sub();
    sub.received();
    sub.set("numberProp", 1);

    // The abandoned `received` must not turn this read into an assertion
    assert_eq!(sub.get("numberProp").value(), Value::from(1));
    assert_eq!(sub.ledger("numberProp").unwrap().assigned_values, vec!["1"]);
}

#[test]
fn test_assignment_through_companion_clears_pending_returns() {
    let sub = sub();
    sub.get("numberProp");
    let companion = sub.returns();
    companion.set("other", 5).unwrap();

    // Nothing is pending any more, so this configures nothing
    companion.invoke(args![7]).unwrap();
    assert!(sub.get("numberProp").into_root().is_some());
    assert!(!sub.ledger("numberProp").unwrap().has_configured_value);
}

#[test]
fn test_returns_without_member_fails() {
    let sub = sub();
    let err = sub.returns().invoke(args![1]).unwrap_err();
    assert_eq!(err, SubstituteError::NoActiveMember("returns"));
}

#[test]
fn test_assertion_without_member_fails() {
    let sub = sub();
    let err = sub.received().invoke(args![1]).unwrap_err();
    assert_eq!(err, SubstituteError::NoActiveMember("received"));
}

#[test]
fn test_probe_members_are_inert() {
    let sub = sub();
    let access = sub.get("toString");

    assert!(access.into_companion().is_some());
    assert!(sub.members().is_empty());
}

#[test]
fn test_configured_probe_members() {
    let config = SubstituteConfig {
        name: Some("probes".to_string()),
        probe_members: vec!["toJSON".to_string()],
    };
    let sub = Substitute::with_config(config);

    assert!(sub.get("toJSON").into_companion().is_some());
    assert!(sub.get("toString").into_root().is_some());
    assert_eq!(sub.members(), vec!["toString"]);
}

#[test]
fn test_constructor_yields_root_without_ledger() {
    let sub = sub();
    assert!(sub.get("constructor").into_root().is_some());
    assert!(sub.ledger("constructor").is_none());
}

#[test]
fn test_members_in_first_touched_order() {
    let sub = Substitute::named("orders");
    sub.set("b", 1);
    sub.call("a", args![]);
    sub.set("b", 2);

    assert_eq!(sub.members(), vec!["b", "a"]);
    assert_eq!(sub.name().as_deref(), Some("orders"));
}

#[test]
fn test_clones_share_ledgers() {
    let sub = sub();
    let handle = sub.clone();
    handle.call("ping", args![1]);

    sub.received().call("ping", args![1]).unwrap();
}

#[test]
fn test_concurrent_calls_stay_on_their_member() {
    const CALLS: usize = 2_000;
    let sub = sub();
    let members = ["alpha", "beta", "gamma", "delta"];

    let workers: Vec<_> = members
        .into_iter()
        .map(|member| {
            let handle = sub.clone();
            std::thread::spawn(move || {
                for _ in 0..CALLS {
                    handle.call(member, args![member]);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for member in members {
        let summary = sub.ledger(member).unwrap();
        let expected = format!("{{String:{member}}}");
        assert_eq!(summary.calls.len(), CALLS, "{member}");
        assert!(
            summary
                .calls
                .iter()
                .all(|call| call.len() == 1 && call[0] == expected),
            "{member} recorded a call made on another member"
        );
    }
}

#[test]
fn test_call_with_configured_return_under_contention() {
    let sub = sub();
    sub.call("left", args![Arg::any()])
        .returns(args!["L"])
        .unwrap();
    sub.call("right", args![Arg::any()])
        .returns(args!["R"])
        .unwrap();

    let workers: Vec<_> = [("left", "L"), ("right", "R")]
        .into_iter()
        .map(|(member, expected)| {
            let handle = sub.clone();
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    assert_eq!(handle.call(member, args![i]).value(), Value::from(expected));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_substitute_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Substitute>();
    assert_send_sync::<Companion>();
}

#[traced_test]
#[test]
fn test_assertion_failure_is_logged() {
    let sub = Substitute::named("mailer");
    let _ = sub.received().call("send", args!["x"]);

    assert!(logs_contain("Substitute assertion failed"));
    assert!(logs_contain("mailer"));
}

#[traced_test]
#[test]
fn test_discarded_state_is_logged() {
    let sub = sub();
    sub.returns();
    sub.get("numberProp");

    assert!(logs_contain("Discarding pending substitute state"));
}
