//! Type definitions for the substitute dispatcher.

use super::companion::Companion;
use super::core::Substitute;
use crate::argument::Argument;
use crate::error::SubstituteError;
use crate::ledger::normalize_times;
use crate::value::Value;

// ============================================================================
// Dispatcher State
// ============================================================================

/// Expected interaction count armed by `received`/`did_not_receive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expectation {
    /// Count as requested; `None` when omitted
    pub times: Option<u32>,
    /// Ignore argument content (`*_with_any_args`)
    pub any_args: bool,
}

impl Expectation {
    pub fn new(times: Option<u32>) -> Self {
        Self {
            times,
            any_args: false,
        }
    }

    pub fn with_any_args(times: Option<u32>) -> Self {
        Self {
            times,
            any_args: true,
        }
    }

    /// Effective count: omitted or zero means once.
    pub fn count(&self) -> usize {
        normalize_times(self.times)
    }
}

/// Pending mode consumed by the next access through the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    ReturnsPending,
    ReturnsAsyncPending,
    AndDoesPending,
    ReceivedPending(Expectation),
    DidNotReceivePending(Expectation),
}

impl DispatchState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DispatchState::Idle)
    }
}

// ============================================================================
// Access Results
// ============================================================================

/// Outcome of an intercepted access on the root substitute.
#[derive(Debug, Clone)]
pub enum Access {
    /// The member produced a value: an assigned or configured property value,
    /// or the configured return of a matching call.
    Value(Value),
    /// The substitute itself, ready to be invoked for the member just read.
    Root(Substitute),
    /// The companion, ready for configuration (`returns`) or inert for probes.
    Companion(Companion),
}

impl Access {
    /// The produced value, or `Undefined` when the access produced a proxy.
    pub fn value(self) -> Value {
        match self {
            Access::Value(value) => value,
            Access::Root(_) | Access::Companion(_) => Value::Undefined,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Access::Value(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Access::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_root(self) -> Option<Substitute> {
        match self {
            Access::Root(root) => Some(root),
            _ => None,
        }
    }

    pub fn into_companion(self) -> Option<Companion> {
        match self {
            Access::Companion(companion) => Some(companion),
            _ => None,
        }
    }

    /// Configure what the member (or the call just made) returns.
    pub fn returns<I, V>(self, values: I) -> Result<Substitute, SubstituteError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        match self {
            Access::Root(root) => root.returns().invoke(values),
            Access::Companion(companion) => companion.returns(values),
            Access::Value(value) => Err(not_configurable(value)),
        }
    }

    /// Like [`Access::returns`], each value wrapped as a deferred value.
    pub fn returns_async<I, V>(self, values: I) -> Result<Substitute, SubstituteError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        match self {
            Access::Root(root) => root.returns_async().invoke(values),
            Access::Companion(companion) => companion.returns_async(values),
            Access::Value(value) => Err(not_configurable(value)),
        }
    }

    /// Run `action` whenever a call matching the one just made is received.
    pub fn and_does<F>(self, action: F) -> Result<Substitute, SubstituteError>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        match self {
            Access::Root(root) => root.and_does().invoke([Value::function(action)]),
            Access::Companion(companion) => companion.and_does(action),
            Access::Value(value) => Err(not_configurable(value)),
        }
    }
}

fn not_configurable(value: Value) -> SubstituteError {
    SubstituteError::NotConfigurable(Argument::new(value).description())
}
