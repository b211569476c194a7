//! Argument matching for configured returns and received-call assertions.
//!
//! A configured argument pattern is a sequence of [`Argument`](crate::Argument)s whose values
//! are either literals, compared by strict equality, or [`Matcher`]s, asked
//! whether they accept the actual argument at that position.
//!
//! # Module Structure
//!
//! - `arg` - Matcher types and the [`Arg`] constructors (`any`, `any_of`, `is`)
//! - `pattern` - Position-by-position pattern matching

mod arg;
mod pattern;

pub use arg::{AnyMatcher, Arg, ArgumentMatcher, Matcher, MatcherKind, PredicateMatcher};
pub use pattern::{arguments_match, first_match};
