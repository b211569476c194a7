//! Recorded argument wrapper.

use crate::value::Value;

/// Type labels produced by [`Argument::type_of`].
pub mod labels {
    pub const UNDEFINED: &str = "undefined";
    pub const NULL: &str = "object";
    pub const NUMBER: &str = "Number";
    pub const STRING: &str = "String";
    pub const BOOLEAN: &str = "Boolean";
    pub const SYMBOL: &str = "Symbol";
    pub const ARRAY: &str = "Array";
    pub const OBJECT: &str = "Object";
    pub const DATE: &str = "Date";
    pub const FUNCTION: &str = "Function";
    pub const PROMISE: &str = "Promise";
}

/// Immutable wrapper around one value passed to or assigned on a substitute.
///
/// A fresh `Argument` is created every time a value is recorded. The original
/// value is kept as-is so identity comparisons against it still hold.
#[derive(Debug, Clone)]
pub struct Argument {
    value: Value,
}

impl Argument {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The value exactly as it was passed.
    pub fn original_value(&self) -> &Value {
        &self.value
    }

    /// Runtime category of the value, see [`Argument::type_of`].
    pub fn type_label(&self) -> &str {
        Self::type_of(&self.value)
    }

    /// `{type:value}`, used in assertion failure messages.
    pub fn description(&self) -> String {
        format!("{{{}:{}}}", self.type_label(), self.value)
    }

    /// Class name for objects that carry one, otherwise the category label.
    pub fn type_of(value: &Value) -> &str {
        match value {
            Value::Undefined => labels::UNDEFINED,
            Value::Null => labels::NULL,
            Value::Bool(_) => labels::BOOLEAN,
            Value::Number(_) => labels::NUMBER,
            Value::String(_) => labels::STRING,
            Value::Symbol(_) => labels::SYMBOL,
            Value::Array(_) => labels::ARRAY,
            Value::Object(obj) => obj.class.as_deref().unwrap_or(labels::OBJECT),
            Value::Date(_) => labels::DATE,
            Value::Function(_) | Value::Matcher(_) => labels::FUNCTION,
            Value::Deferred(_) => labels::PROMISE,
        }
    }

    /// Wrap every value of a call.
    pub fn wrap_all<I, V>(values: I) -> Vec<Argument>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values.into_iter().map(Argument::new).collect()
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
