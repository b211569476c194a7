//! Core substitute state and the root access handlers.
//!
//! `SubstituteContext` owns the member ledgers and the pending dispatcher
//! state. Both the root [`Substitute`] and its [`Companion`] are handles onto
//! the same context.

use super::companion::Companion;
use super::types::{Access, DispatchState, Expectation};
use crate::argument::Argument;
use crate::config::{SubstituteConfig, CONSTRUCTOR_MEMBER, RESERVED_MEMBERS};
use crate::error::SubstituteError;
use crate::ledger::{LedgerSummary, MemberLedger, Resolution};
use crate::value::Value;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Shared state behind a substitute and its companion.
pub(crate) struct SubstituteContext {
    pub(crate) config: SubstituteConfig,
    ledgers: HashMap<String, MemberLedger>,
    /// Member names in first-touched order
    order: Vec<String>,
    pub(crate) state: DispatchState,
    /// Member last read through the root
    pub(crate) root_member: Option<String>,
    /// Member last read through the companion
    pub(crate) companion_member: Option<String>,
}

impl SubstituteContext {
    fn new(config: SubstituteConfig) -> Self {
        Self {
            config,
            ledgers: HashMap::new(),
            order: Vec::new(),
            state: DispatchState::Idle,
            root_member: None,
            companion_member: None,
        }
    }

    /// Name used in log events.
    pub(crate) fn label(&self) -> &str {
        self.config.name.as_deref().unwrap_or("substitute")
    }

    pub(crate) fn ledger(&self, member: &str) -> Option<&MemberLedger> {
        self.ledgers.get(member)
    }

    pub(crate) fn ledger_mut(&mut self, member: &str) -> &mut MemberLedger {
        if !self.ledgers.contains_key(member) {
            self.order.push(member.to_string());
        }
        self.ledgers
            .entry(member.to_string())
            .or_insert_with(|| MemberLedger::new(member))
    }

    pub(crate) fn arm(&mut self, state: DispatchState) {
        if !self.state.is_idle() {
            debug!(
                substitute = %self.label(),
                previous = ?self.state,
                next = ?state,
                "Replacing pending substitute state"
            );
        }
        self.state = state;
    }

    /// Drop pending state left over from an access that never completed.
    fn discard_pending(&mut self, member: &str) {
        if !self.state.is_idle() {
            debug!(
                substitute = %self.label(),
                member,
                discarded = ?self.state,
                "Discarding pending substitute state"
            );
            self.state = DispatchState::Idle;
        }
    }

    /// Record a call on `member`; `None` when no configured return matches.
    fn record_invocation(&mut self, member: &str, args: Vec<Value>) -> Option<Resolution> {
        trace!(substitute = %self.label(), member, args = args.len(), "invoke");
        let ledger = self.ledger_mut(member);
        ledger.record_call(args.clone());
        if !ledger.has_configured_return(&args) {
            return None;
        }
        Some(ledger.resolve_return())
    }

    // ------------------------------------------------------------------------
    // Companion invocation handlers
    // ------------------------------------------------------------------------

    pub(crate) fn apply_returns(
        &mut self,
        values: Vec<Value>,
        is_async: bool,
    ) -> Result<(), SubstituteError> {
        let operation = if is_async { "returnsAsync" } else { "returns" };
        let member = self
            .root_member
            .clone()
            .ok_or(SubstituteError::NoActiveMember(operation))?;

        let ledger = self.ledger_mut(&member);
        if ledger.has_calls() {
            return ledger.promote_last_call_to_return(values, is_async);
        }

        let values = if is_async {
            values.into_iter().map(Value::deferred).collect()
        } else {
            values
        };
        ledger.set_configured_return(values);
        Ok(())
    }

    pub(crate) fn apply_and_does(&mut self, args: Vec<Value>) -> Result<(), SubstituteError> {
        let member = self
            .root_member
            .clone()
            .ok_or(SubstituteError::NoActiveMember("andDoes"))?;

        let action = match args.into_iter().next() {
            Some(Value::Function(action)) => action,
            other => {
                let value = other.unwrap_or_default();
                return Err(SubstituteError::NotCallable(
                    Argument::new(value).description(),
                ));
            }
        };
        self.ledger_mut(&member).promote_last_call_to_action(action)
    }

    fn assertion_target(&self, operation: &'static str) -> Result<String, SubstituteError> {
        self.companion_member
            .clone()
            .or_else(|| self.root_member.clone())
            .ok_or(SubstituteError::NoActiveMember(operation))
    }

    pub(crate) fn assert_received(
        &mut self,
        args: &[Value],
        expectation: Expectation,
    ) -> Result<(), SubstituteError> {
        let member = self.assertion_target("received")?;
        let times = expectation.count();
        let ledger = self.ledger_mut(&member);

        let message = if expectation.any_args {
            if ledger.was_called_with_any_args(expectation.times) {
                return Ok(());
            }
            if ledger.has_calls() {
                format!(
                    "Expected {member} to have been called with any arguments {times} time/s, but it was called {} time/s.\n{}",
                    ledger.call_count(),
                    ledger.all_calls_string()
                )
            } else {
                format!(
                    "Expected {member} to have been called with any arguments {times} time/s, but this method was never called."
                )
            }
        } else {
            if ledger.was_called(args, expectation.times) {
                return Ok(());
            }
            if ledger.has_calls() {
                format!(
                    "Expected {member} to have been called {times} time/s, but no matching call was received.\n{}\n{}",
                    ledger.last_call_string(),
                    ledger.all_calls_string()
                )
            } else {
                format!(
                    "Expected {member} to have been called {times} time/s, but this method was never called."
                )
            }
        };
        Err(self.assertion_failed(member, message))
    }

    pub(crate) fn assert_did_not_receive(
        &mut self,
        args: &[Value],
        expectation: Expectation,
    ) -> Result<(), SubstituteError> {
        let member = self.assertion_target("didNotReceive")?;
        let times = expectation.count();
        let ledger = self.ledger_mut(&member);

        let message = if expectation.any_args {
            if !ledger.was_called_with_any_args(expectation.times) {
                return Ok(());
            }
            format!(
                "Expected {member} not to have been called with any arguments {times} time/s, but it was called {} time/s.\n{}",
                ledger.call_count(),
                ledger.all_calls_string()
            )
        } else {
            // Zero-argument calls count as a minimum here; an exact count would
            // let extra calls pass
            let called = if args.is_empty() {
                ledger.zero_argument_call_count() >= times
            } else {
                ledger.was_called(args, expectation.times)
            };
            if !called {
                return Ok(());
            }
            format!(
                "Expected {member} not to have been called {times} time/s, but a matching call was received.\n{}",
                ledger.all_calls_string()
            )
        };
        Err(self.assertion_failed(member, message))
    }

    pub(crate) fn assert_assigned(
        &mut self,
        member: &str,
        value: &Value,
        expectation: Expectation,
    ) -> Result<(), SubstituteError> {
        let times = expectation.count();
        let ledger = self.ledger_mut(member);

        let message = if expectation.any_args {
            if ledger.assigned_values().len() >= times {
                return Ok(());
            }
            format!(
                "Expected {member} to have been assigned any value {times} time/s.\nActual assignments were: {}",
                ledger.assigned_values_string()
            )
        } else {
            if ledger.was_assigned(value, Some(times as u32)) {
                return Ok(());
            }
            format!(
                "Expected {member} to have been assigned the value {value}, {times} time/s.\nActual assignments were: {}",
                ledger.assigned_values_string()
            )
        };
        Err(self.assertion_failed(member.to_string(), message))
    }

    pub(crate) fn assert_not_assigned(
        &mut self,
        member: &str,
        value: &Value,
        expectation: Expectation,
    ) -> Result<(), SubstituteError> {
        let times = expectation.count();
        let ledger = self.ledger_mut(member);

        let message = if expectation.any_args {
            if ledger.assigned_values().len() < times {
                return Ok(());
            }
            format!(
                "Expected {member} not to have been assigned any value {times} time/s.\nActual assignments were: {}",
                ledger.assigned_values_string()
            )
        } else {
            // Without an explicit count a single assignment is enough to fail
            let exact = expectation.times.filter(|t| *t > 0);
            if !ledger.was_assigned(value, exact) {
                return Ok(());
            }
            format!(
                "Expected {member} not to have been assigned the value {value}, {times} time/s.\nActual assignments were: {}",
                ledger.assigned_values_string()
            )
        };
        Err(self.assertion_failed(member.to_string(), message))
    }

    fn assertion_failed(&self, member: String, message: String) -> SubstituteError {
        warn!(substitute = %self.label(), member = %member, "Substitute assertion failed");
        SubstituteError::assertion(member, message)
    }
}

/// A test double standing in for an arbitrary shape.
///
/// Members are addressed by name. Reading, assigning and invoking them is
/// recorded in a per-member ledger; `returns` configures what they hand back
/// and `received`/`did_not_receive` verify what happened.
///
/// ```
/// use rift_double::{args, Substitute, Value};
///
/// let calculator = Substitute::new();
/// calculator.call("add", args![1, 2]).returns(args![3]).unwrap();
///
/// assert_eq!(calculator.call("add", args![1, 2]).value(), Value::from(3));
/// assert!(calculator.call("add", args![2, 2]).value().is_undefined());
///
/// calculator.received().call("add", args![1, 2]).unwrap();
/// assert!(calculator.did_not_receive().call("add", args![5, 5]).is_ok());
/// ```
///
/// Clones are handles to the same substitute.
#[derive(Clone)]
pub struct Substitute {
    context: Arc<Mutex<SubstituteContext>>,
}

impl Default for Substitute {
    fn default() -> Self {
        Self::new()
    }
}

impl Substitute {
    pub fn new() -> Self {
        Self::with_config(SubstituteConfig::default())
    }

    /// Substitute whose log events carry `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_config(SubstituteConfig::named(name))
    }

    pub fn with_config(config: SubstituteConfig) -> Self {
        Self {
            context: Arc::new(Mutex::new(SubstituteContext::new(config))),
        }
    }

    pub(crate) fn from_context(context: Arc<Mutex<SubstituteContext>>) -> Self {
        Self { context }
    }

    fn lock(&self) -> MutexGuard<'_, SubstituteContext> {
        self.context.lock()
    }

    fn companion(&self) -> Companion {
        Companion::from_context(self.context.clone())
    }

    // ------------------------------------------------------------------------
    // Intercepted access
    // ------------------------------------------------------------------------

    /// Read a member.
    ///
    /// Members with an assigned or configured value yield it directly; others
    /// yield the substitute itself so the member can be invoked next.
    pub fn get(&self, member: &str) -> Access {
        match member {
            "returns" => return Access::Companion(self.returns()),
            "returnsAsync" => return Access::Companion(self.returns_async()),
            "andDoes" => return Access::Companion(self.and_does()),
            "received" => return Access::Companion(self.received()),
            "receivedWithAnyArgs" => return Access::Companion(self.received_with_any_args()),
            "didNotReceive" => return Access::Companion(self.did_not_receive()),
            "didNotReceiveWithAnyArgs" => {
                return Access::Companion(self.did_not_receive_with_any_args())
            }
            _ => {}
        }

        let mut ctx = self.lock();
        if ctx.config.is_probe_member(member) {
            return Access::Companion(self.companion());
        }
        ctx.discard_pending(member);
        if member == CONSTRUCTOR_MEMBER {
            return Access::Root(self.clone());
        }

        trace!(substitute = %ctx.label(), member, "get");
        ctx.root_member = Some(member.to_string());
        let ledger = ctx.ledger_mut(member);
        if ledger.has_assigned_value() || ledger.has_configured_return_value() {
            return Access::Value(ledger.current_property_value());
        }
        Access::Root(self.clone())
    }

    /// Assign a member. Always succeeds.
    pub fn set(&self, member: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut ctx = self.lock();
        ctx.discard_pending(member);
        trace!(substitute = %ctx.label(), member, value = %value, "set");
        ctx.ledger_mut(member).set_assigned_value(value);
    }

    /// Invoke the member last read through [`Substitute::get`].
    ///
    /// The call is recorded; a matching configured return is produced,
    /// otherwise the companion is returned so the call can be configured.
    pub fn invoke<I, V>(&self, args: I) -> Access
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();

        let resolution = {
            let mut ctx = self.lock();
            ctx.discard_pending("()");
            let Some(member) = ctx.root_member.clone() else {
                return Access::Companion(self.companion());
            };
            match ctx.record_invocation(&member, args) {
                Some(resolution) => resolution,
                None => return Access::Companion(self.companion()),
            }
        };
        self.complete(resolution)
    }

    /// Read `member` and invoke it with `args`.
    ///
    /// A member holding a function value calls that function instead of being
    /// recorded; any other value is handed back unchanged.
    pub fn call<I, V>(&self, member: &str, args: I) -> Access
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if RESERVED_MEMBERS.contains(&member) || member == CONSTRUCTOR_MEMBER {
            return match self.get(member) {
                Access::Root(root) => root.invoke(args),
                other => other,
            };
        }
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();

        // Read and invocation share one lock so concurrent handles cannot
        // swap the active member in between
        let resolution = {
            let mut ctx = self.lock();
            if ctx.config.is_probe_member(member) {
                return Access::Companion(self.companion());
            }
            ctx.discard_pending(member);
            ctx.root_member = Some(member.to_string());

            let ledger = ctx.ledger_mut(member);
            if ledger.has_assigned_value() || ledger.has_configured_return_value() {
                match ledger.current_property_value() {
                    Value::Function(action) => Resolution::Action {
                        action,
                        arguments: args,
                    },
                    value => return Access::Value(value),
                }
            } else {
                match ctx.record_invocation(member, args) {
                    Some(resolution) => resolution,
                    None => return Access::Companion(self.companion()),
                }
            }
        };
        self.complete(resolution)
    }

    fn complete(&self, resolution: Resolution) -> Access {
        match resolution {
            Resolution::Value(value) => Access::Value(value),
            // Run outside the lock so the action may use the substitute
            Resolution::Action { action, arguments } => Access::Value(action.call(&arguments)),
        }
    }

    // ------------------------------------------------------------------------
    // Reserved configuration and assertion members
    // ------------------------------------------------------------------------

    pub fn returns(&self) -> Companion {
        self.arm(DispatchState::ReturnsPending)
    }

    pub fn returns_async(&self) -> Companion {
        self.arm(DispatchState::ReturnsAsyncPending)
    }

    pub fn and_does(&self) -> Companion {
        self.arm(DispatchState::AndDoesPending)
    }

    /// Expect the next access through the companion to have happened once.
    pub fn received(&self) -> Companion {
        self.arm(DispatchState::ReceivedPending(Expectation::new(None)))
    }

    /// Expect the next access through the companion to have happened `times` times.
    pub fn received_times(&self, times: u32) -> Companion {
        self.arm(DispatchState::ReceivedPending(Expectation::new(Some(times))))
    }

    pub fn received_with_any_args(&self) -> Companion {
        self.arm(DispatchState::ReceivedPending(Expectation::with_any_args(
            None,
        )))
    }

    pub fn received_with_any_args_times(&self, times: u32) -> Companion {
        self.arm(DispatchState::ReceivedPending(Expectation::with_any_args(
            Some(times),
        )))
    }

    pub fn did_not_receive(&self) -> Companion {
        self.arm(DispatchState::DidNotReceivePending(Expectation::new(None)))
    }

    pub fn did_not_receive_times(&self, times: u32) -> Companion {
        self.arm(DispatchState::DidNotReceivePending(Expectation::new(
            Some(times),
        )))
    }

    pub fn did_not_receive_with_any_args(&self) -> Companion {
        self.arm(DispatchState::DidNotReceivePending(
            Expectation::with_any_args(None),
        ))
    }

    pub fn did_not_receive_with_any_args_times(&self, times: u32) -> Companion {
        self.arm(DispatchState::DidNotReceivePending(
            Expectation::with_any_args(Some(times)),
        ))
    }

    fn arm(&self, state: DispatchState) -> Companion {
        self.lock().arm(state);
        self.companion()
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Snapshot of one member's ledger, if the member was ever touched.
    pub fn ledger(&self, member: &str) -> Option<LedgerSummary> {
        self.lock().ledger(member).map(MemberLedger::summary)
    }

    /// Names of all touched members, in first-touched order.
    pub fn members(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    pub fn name(&self) -> Option<String> {
        self.lock().config.name.clone()
    }
}

impl fmt::Debug for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.lock();
        f.debug_struct("Substitute")
            .field("name", &ctx.config.name)
            .field("members", &ctx.order)
            .field("state", &ctx.state)
            .finish()
    }
}
