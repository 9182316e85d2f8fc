#![deny(missing_docs)]
//! # Types
//!
//! Types shared between the contract-level invariant engine and the
//! execution-frame firewall of the statefence VM.

pub use primitive_types::{H160, H256, U256};

pub mod convert;
pub mod delta;
pub mod policy;

pub use delta::DeltaConstraint;
pub use policy::{Category, MutableSet, MutableSetList, PolicyEntry};

/// A 20-byte account address.
pub type Address = H160;

/// The unsigned 256-bit machine word. Balances and slot values are words.
pub type Word = U256;

/// A 32-byte storage or transient-storage slot key.
pub type Key = H256;

/// A 32-byte hash, e.g. an account's code hash.
pub type Hash = H256;

/// Unit used to measure gas.
pub type Gas = u64;
