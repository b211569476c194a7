//! Errors raised by substitutes.

use thiserror::Error;

/// Failure raised synchronously by the access that triggered it.
///
/// Only [`SubstituteError::Assertion`] reports a broken expectation about the
/// code under test; the other variants mean the substitute itself was driven
/// in an order it cannot honour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstituteError {
    #[error("{message}")]
    Assertion { member: String, message: String },
    #[error("Cannot configure a return for {0}: no call has been recorded")]
    NoRecordedCall(String),
    #[error("Cannot apply {0}: no member of the substitute has been accessed")]
    NoActiveMember(&'static str),
    #[error("Cannot configure the value {0}: the member already produced a value")]
    NotConfigurable(String),
    #[error("andDoes expects a function, got {0}")]
    NotCallable(String),
}

impl SubstituteError {
    pub(crate) fn assertion(member: impl Into<String>, message: impl Into<String>) -> Self {
        SubstituteError::Assertion {
            member: member.into(),
            message: message.into(),
        }
    }

    /// Whether this error reports an unmet `received`/`did_not_receive` expectation.
    pub fn is_assertion(&self) -> bool {
        matches!(self, SubstituteError::Assertion { .. })
    }

    /// Member the error refers to, when there is one.
    pub fn member(&self) -> Option<&str> {
        match self {
            SubstituteError::Assertion { member, .. } | SubstituteError::NoRecordedCall(member) => {
                Some(member)
            }
            _ => None,
        }
    }
}
