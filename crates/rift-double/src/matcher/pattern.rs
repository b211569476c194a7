//! Position-by-position matching of argument patterns against calls.

use super::arg::ArgumentMatcher;
use crate::argument::Argument;
use crate::value::Value;

/// Check whether a configured `pattern` matches the `call` arguments.
///
/// Positions are compared up to the pattern's length; extra call arguments are
/// ignored and missing ones compare as `Undefined`. A matcher position must
/// accept the argument, a literal position must be strictly equal to it. An
/// empty pattern matches only a call with no arguments.
pub fn arguments_match(pattern: &[Argument], call: &[Argument]) -> bool {
    if pattern.is_empty() {
        return call.is_empty();
    }

    let omitted = Argument::new(Value::Undefined);
    pattern.iter().enumerate().all(|(i, expected)| {
        let actual = call.get(i).unwrap_or(&omitted);
        match expected.original_value() {
            Value::Matcher(matcher) => matcher.matches(actual),
            literal => literal.strict_equals(actual.original_value()),
        }
    })
}

/// Index of the first pattern matching `call`, in configuration order.
pub fn first_match<'a, I>(patterns: I, call: &[Argument]) -> Option<usize>
where
    I: IntoIterator<Item = &'a [Argument]>,
{
    patterns
        .into_iter()
        .position(|pattern| arguments_match(pattern, call))
}
