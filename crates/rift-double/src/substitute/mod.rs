//! Interception dispatcher for Rift doubles.
//!
//! This module provides:
//! - `Substitute`: The root double that records every member access
//! - `Companion`: The proxy through which configuration and assertions flow
//! - `Access`: What an intercepted root access produced
//!
//! A double and its companion share one context, so clones of either are
//! handles to the same ledgers.
//!
//! ## Module Structure
//!
//! - `types`: Dispatcher state, expectations and access results
//! - `core`: Shared context and the root `Substitute`
//! - `companion`: The `Companion` proxy

mod companion;
mod core;
mod types;

#[cfg(test)]
mod tests;

pub use companion::Companion;
pub use core::Substitute;
pub use types::{Access, DispatchState, Expectation};
