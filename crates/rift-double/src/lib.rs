//! Rift doubles: runtime substitutes for any shape.
//!
//! A [`Substitute`] stands in for an object whose members are only known by
//! name. Every read, assignment and invocation is recorded in a per-member
//! ledger. Returns are configured by replaying a call and chaining
//! `returns`, and interactions are verified with `received` /
//! `did_not_receive`.
//!
//! ```
//! use rift_double::{args, Arg, Substitute, Value};
//!
//! let repository = Substitute::named("repository");
//! repository
//!     .call("find", args![Arg::any_of("Number")])
//!     .returns(args!["found"])
//!     .unwrap();
//!
//! assert_eq!(repository.call("find", args![7]).value(), Value::from("found"));
//! repository.received().call("find", args![7]).unwrap();
//! ```

// ===== Values and arguments =====
pub mod argument;
pub mod value;

// ===== Matching and bookkeeping =====
pub mod ledger;
pub mod matcher;

// ===== Dispatcher =====
pub mod config;
pub mod error;
pub mod substitute;

pub use argument::{labels, Argument};
pub use config::SubstituteConfig;
pub use error::SubstituteError;
pub use ledger::{LedgerSummary, MemberLedger};
pub use matcher::{Arg, ArgumentMatcher, Matcher, MatcherKind};
pub use substitute::{Access, Companion, Substitute};
pub use value::{Deferred, Function, Object, Symbol, Value};
