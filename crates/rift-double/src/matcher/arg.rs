//! Matcher types and their constructors.

use crate::argument::{labels, Argument};
use std::fmt;
use std::sync::Arc;

/// Something that can accept or reject a recorded argument.
pub trait ArgumentMatcher {
    /// Check whether `argument` satisfies this matcher.
    fn matches(&self, argument: &Argument) -> bool;
}

/// Wildcard matcher, optionally restricted to a type label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnyMatcher {
    type_label: Option<String>,
}

impl AnyMatcher {
    pub fn new(type_label: Option<String>) -> Self {
        Self { type_label }
    }

    pub fn type_label(&self) -> Option<&str> {
        self.type_label.as_deref()
    }
}

impl ArgumentMatcher for AnyMatcher {
    fn matches(&self, argument: &Argument) -> bool {
        match self.type_label.as_deref() {
            None => true,
            // The label alone cannot tell a real sequence from an object labelled
            // "Array", so check the value itself.
            Some(labels::ARRAY) => argument.original_value().as_array().is_some(),
            Some(label) => argument.type_label() == label,
        }
    }
}

/// Boxed predicate over a recorded argument.
pub type Predicate = dyn Fn(&Argument) -> bool + Send + Sync;

/// Matcher delegating to an arbitrary predicate.
#[derive(Clone)]
pub struct PredicateMatcher {
    predicate: Arc<Predicate>,
}

impl PredicateMatcher {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Argument) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

impl ArgumentMatcher for PredicateMatcher {
    fn matches(&self, argument: &Argument) -> bool {
        (self.predicate)(argument)
    }
}

impl fmt::Debug for PredicateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateMatcher")
    }
}

/// The built-in matcher kinds.
#[derive(Debug, Clone)]
pub enum MatcherKind {
    Any(AnyMatcher),
    Is(PredicateMatcher),
}

/// Tagged matcher value.
///
/// Matchers travel through a substitute as [`Value::Matcher`](crate::Value::Matcher)
/// so they can sit in an argument list next to literal values. Each matcher
/// has its own identity; clones share it.
#[derive(Debug, Clone)]
pub struct Matcher(Arc<MatcherKind>);

impl Matcher {
    pub fn new(kind: MatcherKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &MatcherKind {
        &self.0
    }

    pub fn same_matcher(&self, other: &Matcher) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl ArgumentMatcher for Matcher {
    fn matches(&self, argument: &Argument) -> bool {
        match self.kind() {
            MatcherKind::Any(any) => any.matches(argument),
            MatcherKind::Is(predicate) => predicate.matches(argument),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            MatcherKind::Any(any) => match any.type_label() {
                Some(label) => write!(f, "Arg.any({label})"),
                None => f.write_str("Arg.any()"),
            },
            MatcherKind::Is(_) => f.write_str("Arg.is(predicate)"),
        }
    }
}

/// Matcher constructors.
///
/// ```
/// use rift_double::{Arg, Argument, ArgumentMatcher};
///
/// assert!(Arg::any().matches(&Argument::new(42)));
/// assert!(Arg::any_of("String").matches(&Argument::new("text")));
/// assert!(!Arg::any_of("String").matches(&Argument::new(42)));
/// assert!(Arg::is(|a| a.original_value().as_f64() < Some(5.0)).matches(&Argument::new(1)));
/// ```
pub struct Arg;

impl Arg {
    /// Matches every argument, including an omitted one.
    pub fn any() -> Matcher {
        Matcher::new(MatcherKind::Any(AnyMatcher::new(None)))
    }

    /// Matches arguments whose type label equals `type_label`.
    ///
    /// `"Array"` matches only actual arrays.
    pub fn any_of(type_label: impl Into<String>) -> Matcher {
        Matcher::new(MatcherKind::Any(AnyMatcher::new(Some(type_label.into()))))
    }

    /// Matches arguments accepted by `predicate`.
    pub fn is<F>(predicate: F) -> Matcher
    where
        F: Fn(&Argument) -> bool + Send + Sync + 'static,
    {
        Matcher::new(MatcherKind::Is(PredicateMatcher::new(predicate)))
    }
}
