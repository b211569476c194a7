//! Member ledgers: the bookkeeping behind every substitute member.
//!
//! A ledger is created lazily the first time a member name is touched and
//! lives as long as its substitute. It records:
//! - assigned values (property-style writes)
//! - calls, each as a list of [`Argument`](crate::Argument)s
//! - a configured property value or sequence of values
//! - return setups keyed by argument pattern
//!
//! # Module Structure
//!
//! - `cursor` - Clamping cursor over configured value sequences
//! - `types` - Return setups, configured values and snapshot types
//! - `member` - The `MemberLedger` itself

mod cursor;
mod member;
mod types;

pub use cursor::SequenceCursor;
pub use member::MemberLedger;
pub(crate) use member::{describe_call, normalize_times};
pub use types::{ConfiguredValue, LedgerSummary, Resolution, ReturnSetup};
