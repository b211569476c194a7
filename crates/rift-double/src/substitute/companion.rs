//! The companion proxy used while configuring or asserting.

use super::core::{Substitute, SubstituteContext};
use super::types::DispatchState;
use crate::error::SubstituteError;
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Secondary proxy reached through the reserved members of a [`Substitute`].
///
/// Whatever mode was armed on the root (`returns`, `received`, ...) is consumed
/// by the next invocation or assignment made through the companion, after
/// which control returns to the root.
#[derive(Clone)]
pub struct Companion {
    context: Arc<Mutex<SubstituteContext>>,
}

impl Companion {
    pub(crate) fn from_context(context: Arc<Mutex<SubstituteContext>>) -> Self {
        Self { context }
    }

    fn root(&self) -> Substitute {
        Substitute::from_context(self.context.clone())
    }

    /// Read a member through the companion.
    ///
    /// `returns`, `returnsAsync` and `andDoes` re-arm the pending mode; probe
    /// members are inert; any other name becomes the assertion target.
    pub fn get(&self, member: &str) -> Companion {
        let mut ctx = self.context.lock();
        match member {
            "returns" => ctx.arm(DispatchState::ReturnsPending),
            "returnsAsync" => ctx.arm(DispatchState::ReturnsAsyncPending),
            "andDoes" => ctx.arm(DispatchState::AndDoesPending),
            _ if ctx.config.is_probe_member(member) => {}
            _ => {
                trace!(substitute = %ctx.label(), member, "companion get");
                ctx.companion_member = Some(member.to_string());
                ctx.ledger_mut(member);
            }
        }
        self.clone()
    }

    /// Apply the pending mode with `args`.
    ///
    /// Configuration modes store `args` as return values (or, for `and_does`,
    /// the action); assertion modes check the target's calls against `args`.
    pub fn invoke<I, V>(&self, args: I) -> Result<Substitute, SubstituteError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        let mut ctx = self.context.lock();
        let state = std::mem::take(&mut ctx.state);

        let result = match state {
            DispatchState::ReturnsPending => ctx.apply_returns(args, false),
            DispatchState::ReturnsAsyncPending => ctx.apply_returns(args, true),
            DispatchState::AndDoesPending => ctx.apply_and_does(args),
            DispatchState::ReceivedPending(expectation) => {
                ctx.assert_received(&args, expectation)
            }
            DispatchState::DidNotReceivePending(expectation) => {
                ctx.assert_did_not_receive(&args, expectation)
            }
            DispatchState::Idle => {
                trace!(substitute = %ctx.label(), "companion invoked with nothing pending");
                Ok(())
            }
        };
        ctx.companion_member = None;
        drop(ctx);

        result.map(|()| self.root())
    }

    /// Assign a member through the companion.
    ///
    /// Under `received`/`did_not_receive` this asserts the member's assignment
    /// history; in any other mode it only clears the pending mode.
    pub fn set(&self, member: &str, value: impl Into<Value>) -> Result<(), SubstituteError> {
        let value = value.into();
        let mut ctx = self.context.lock();
        let state = std::mem::take(&mut ctx.state);

        let result = match state {
            DispatchState::ReceivedPending(expectation) => {
                ctx.assert_assigned(member, &value, expectation)
            }
            DispatchState::DidNotReceivePending(expectation) => {
                ctx.assert_not_assigned(member, &value, expectation)
            }
            other => {
                debug!(
                    substitute = %ctx.label(),
                    member,
                    discarded = ?other,
                    "Ignoring assignment through companion"
                );
                Ok(())
            }
        };
        ctx.companion_member = None;
        result
    }

    /// Read `member` and invoke it with `args`.
    pub fn call<I, V>(&self, member: &str, args: I) -> Result<Substitute, SubstituteError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.get(member).invoke(args)
    }

    /// Configure the values handed back, in order, by the call just made.
    pub fn returns<I, V>(&self, values: I) -> Result<Substitute, SubstituteError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.get("returns").invoke(values)
    }

    pub fn returns_async<I, V>(&self, values: I) -> Result<Substitute, SubstituteError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.get("returnsAsync").invoke(values)
    }

    pub fn and_does<F>(&self, action: F) -> Result<Substitute, SubstituteError>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.get("andDoes").invoke([Value::function(action)])
    }
}

impl fmt::Debug for Companion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.context.lock();
        f.debug_struct("Companion")
            .field("state", &ctx.state)
            .field("member", &ctx.companion_member)
            .finish()
    }
}
