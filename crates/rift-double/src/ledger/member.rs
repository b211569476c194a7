//! Per-member record of calls, assignments and configured returns.

use super::types::{ConfiguredValue, LedgerSummary, Resolution, ReturnSetup};
use crate::argument::Argument;
use crate::error::SubstituteError;
use crate::matcher::{arguments_match, first_match};
use crate::value::{Deferred, Function, Value};
use tracing::debug;

/// Ledger for one member name of a substitute.
///
/// A member is driven either as a property (assigned values) or by configured
/// returns, never both: assigning clears configured returns and configuring a
/// return clears assignment history.
#[derive(Debug, Clone)]
pub struct MemberLedger {
    member: String,
    assigned_values: Vec<Value>,
    last_assigned_value: Value,
    calls: Vec<Vec<Argument>>,
    last_call: Option<Vec<Argument>>,
    configured: Option<ConfiguredValue>,
    return_setups: Vec<ReturnSetup>,
}

impl MemberLedger {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            assigned_values: Vec::new(),
            last_assigned_value: Value::Undefined,
            calls: Vec::new(),
            last_call: None,
            configured: None,
            return_setups: Vec::new(),
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    // ------------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------------

    /// Record a call with the given raw arguments.
    pub fn record_call(&mut self, args: Vec<Value>) {
        let call = Argument::wrap_all(args);
        self.last_call = Some(call.clone());
        self.calls.push(call);
    }

    pub fn has_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn calls(&self) -> &[Vec<Argument>] {
        &self.calls
    }

    /// Arguments of the most recent call still on the call stack.
    pub fn last_call_arguments(&self) -> Option<&[Argument]> {
        self.last_call.as_deref()
    }

    pub fn last_call_argument_values(&self) -> Vec<Value> {
        self.last_call
            .iter()
            .flatten()
            .map(|a| a.original_value().clone())
            .collect()
    }

    /// Turn the most recent call into a return setup for its arguments.
    pub fn promote_last_call_to_return(
        &mut self,
        values: Vec<Value>,
        is_async: bool,
    ) -> Result<(), SubstituteError> {
        let pattern = self.pop_last_call()?;
        debug!(
            member = %self.member,
            pattern = %describe_call(&pattern),
            values = values.len(),
            is_async,
            "Configured return for call"
        );
        self.return_setups
            .push(ReturnSetup::returning(pattern, values, is_async));
        Ok(())
    }

    /// Turn the most recent call into an action setup for its arguments.
    pub fn promote_last_call_to_action(&mut self, action: Function) -> Result<(), SubstituteError> {
        let pattern = self.pop_last_call()?;
        debug!(
            member = %self.member,
            pattern = %describe_call(&pattern),
            "Configured action for call"
        );
        self.return_setups.push(ReturnSetup::acting(pattern, action));
        Ok(())
    }

    fn pop_last_call(&mut self) -> Result<Vec<Argument>, SubstituteError> {
        let call = self
            .calls
            .pop()
            .ok_or_else(|| SubstituteError::NoRecordedCall(self.member.clone()))?;
        self.last_call = self.calls.last().cloned();
        Ok(call)
    }

    /// Whether some return setup matches these raw arguments.
    pub fn has_configured_return(&self, args: &[Value]) -> bool {
        if self.return_setups.is_empty() {
            return false;
        }
        let call = Argument::wrap_all(args.iter().cloned());
        self.return_setups
            .iter()
            .any(|setup| arguments_match(&setup.pattern, &call))
    }

    /// Resolve the last call against the return setups, first match wins.
    pub fn resolve_return(&mut self) -> Resolution {
        let Some(call) = self.last_call.as_deref() else {
            return Resolution::Value(Value::Undefined);
        };
        let patterns = self.return_setups.iter().map(|s| s.pattern.as_slice());
        let Some(index) = first_match(patterns, call) else {
            return Resolution::Value(Value::Undefined);
        };
        let arguments: Vec<Value> = call.iter().map(|a| a.original_value().clone()).collect();

        let setup = &mut self.return_setups[index];
        if let Some(action) = &setup.action {
            return Resolution::Action {
                action: action.clone(),
                arguments,
            };
        }

        let value = setup
            .cursor
            .next_in(&setup.return_values)
            .cloned()
            .unwrap_or_default();
        if setup.is_async {
            Resolution::Value(Value::Deferred(Deferred::resolved(value)))
        } else {
            Resolution::Value(value)
        }
    }

    /// Whether a call matching `args` was received at least `min_times` times.
    ///
    /// A zero-argument query counts zero-argument calls and requires exactly
    /// `min_times` of them.
    pub fn was_called(&self, args: &[Value], min_times: Option<u32>) -> bool {
        let required = normalize_times(min_times);

        if args.is_empty() {
            return self.zero_argument_call_count() == required;
        }

        let pattern = Argument::wrap_all(args.iter().cloned());
        let mut matched = 0;
        for call in &self.calls {
            if arguments_match(&pattern, call) {
                matched += 1;
                if matched >= required {
                    return true;
                }
            }
        }
        false
    }

    pub fn zero_argument_call_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_empty()).count()
    }

    /// Whether at least `min_times` calls were received, whatever the arguments.
    pub fn was_called_with_any_args(&self, min_times: Option<u32>) -> bool {
        self.calls.len() >= normalize_times(min_times)
    }

    // ------------------------------------------------------------------------
    // Assignments and configured values
    // ------------------------------------------------------------------------

    /// Record an assignment, dropping any configured return value.
    pub fn set_assigned_value(&mut self, value: Value) {
        self.configured = None;
        self.last_assigned_value = value.clone();
        self.assigned_values.push(value);
    }

    /// Configure the value(s) to read back, dropping assignment history.
    pub fn set_configured_return(&mut self, values: Vec<Value>) {
        self.assigned_values.clear();
        self.last_assigned_value = Value::Undefined;
        let configured = ConfiguredValue::from_values(values);
        debug!(
            member = %self.member,
            sequence = configured.is_sequence(),
            "Configured property value"
        );
        self.configured = Some(configured);
    }

    pub fn has_assigned_value(&self) -> bool {
        !self.assigned_values.is_empty()
    }

    pub fn has_configured_return_value(&self) -> bool {
        self.configured.is_some()
    }

    pub fn assigned_values(&self) -> &[Value] {
        &self.assigned_values
    }

    /// Value a property read yields; configured sequences advance on each read.
    pub fn current_property_value(&mut self) -> Value {
        match self.configured.as_mut() {
            Some(configured) => configured.read(),
            None => self.last_assigned_value.clone(),
        }
    }

    /// Count assignments strictly equal to `value`.
    ///
    /// With `exact_times` the count must equal it; otherwise one is enough.
    pub fn was_assigned(&self, value: &Value, exact_times: Option<u32>) -> bool {
        let count = self
            .assigned_values
            .iter()
            .filter(|v| v.strict_equals(value))
            .count();
        match exact_times {
            Some(times) => count == times as usize,
            None => count >= 1,
        }
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    pub fn all_calls_string(&self) -> String {
        let calls: Vec<String> = self.calls.iter().map(|c| describe_call(c)).collect();
        format!("All Calls:\n{}", calls.join("\n"))
    }

    pub fn last_call_string(&self) -> String {
        format!(
            "Last Call:\n{}",
            describe_call(self.last_call.as_deref().unwrap_or_default())
        )
    }

    pub fn assigned_values_string(&self) -> String {
        let values: Vec<String> = self.assigned_values.iter().map(Value::to_string).collect();
        format!("[ {} ]", values.join(", "))
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            member: self.member.clone(),
            calls: self
                .calls
                .iter()
                .map(|c| c.iter().map(Argument::description).collect())
                .collect(),
            assigned_values: self.assigned_values.iter().map(Value::to_string).collect(),
            has_configured_value: self.configured.is_some(),
            return_setup_count: self.return_setups.len(),
        }
    }
}

/// An omitted or zero count means once.
pub(crate) fn normalize_times(times: Option<u32>) -> usize {
    match times {
        Some(t) if t > 0 => t as usize,
        _ => 1,
    }
}

pub(crate) fn describe_call(call: &[Argument]) -> String {
    let parts: Vec<String> = call.iter().map(Argument::description).collect();
    format!("[ {} ]", parts.join(", "))
}
