//! Type definitions for member ledgers.

use super::cursor::SequenceCursor;
use crate::argument::Argument;
use crate::value::{Function, Value};
use serde::Serialize;

// ============================================================================
// Return Setups
// ============================================================================

/// A stored association between an argument pattern and what to hand back.
#[derive(Debug, Clone)]
pub struct ReturnSetup {
    /// Arguments of the configuration call, literals or matchers
    pub pattern: Vec<Argument>,
    pub return_values: Vec<Value>,
    /// Wrap each returned value in a `Deferred`
    pub is_async: bool,
    pub cursor: SequenceCursor,
    /// Callback run on each matching call (`and_does`)
    pub action: Option<Function>,
}

impl ReturnSetup {
    pub fn returning(pattern: Vec<Argument>, return_values: Vec<Value>, is_async: bool) -> Self {
        Self {
            pattern,
            return_values,
            is_async,
            cursor: SequenceCursor::new(),
            action: None,
        }
    }

    pub fn acting(pattern: Vec<Argument>, action: Function) -> Self {
        Self {
            pattern,
            return_values: Vec::new(),
            is_async: false,
            cursor: SequenceCursor::new(),
            action: Some(action),
        }
    }
}

/// What a matching call resolved to.
///
/// An action is returned rather than run so the caller can release the
/// substitute's lock first.
#[derive(Debug, Clone)]
pub enum Resolution {
    Value(Value),
    Action {
        action: Function,
        arguments: Vec<Value>,
    },
}

// ============================================================================
// Configured Property Values
// ============================================================================

/// Value(s) configured with `returns` on a member that was never called.
#[derive(Debug, Clone)]
pub enum ConfiguredValue {
    Single(Value),
    Sequence {
        values: Vec<Value>,
        cursor: SequenceCursor,
    },
}

impl ConfiguredValue {
    /// A single value, or a sequence when more than one value is given.
    pub fn from_values(mut values: Vec<Value>) -> Self {
        if values.len() > 1 {
            ConfiguredValue::Sequence {
                values,
                cursor: SequenceCursor::new(),
            }
        } else {
            ConfiguredValue::Single(values.pop().unwrap_or_default())
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ConfiguredValue::Sequence { .. })
    }

    /// Read the current value; sequences advance and stop on their last element.
    pub fn read(&mut self) -> Value {
        match self {
            ConfiguredValue::Single(value) => value.clone(),
            ConfiguredValue::Sequence { values, cursor } => {
                cursor.next_in(values).cloned().unwrap_or_default()
            }
        }
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Serializable view of a member ledger for debugging.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub member: String,
    /// One entry per recorded call, each argument as `{type:value}`
    pub calls: Vec<Vec<String>>,
    pub assigned_values: Vec<String>,
    pub has_configured_value: bool,
    pub return_setup_count: usize,
}
