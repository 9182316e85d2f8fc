#![deny(missing_docs)]
//! # Storage
//!
//! Traits for the account state layer read and written by the statefence VM
//! and sampled by the invariant engine.

use serde::{Deserialize, Serialize};
use statefence_types::{Address, Hash, Key, Word};
use std::sync::Arc;

/// Account code. Shared so that loading code for a frame never copies it.
pub type Code = Arc<[u8]>;

/// The non-storage fields of an account.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The account's nonce.
    pub nonce: u64,
    /// The account's native balance.
    pub balance: Word,
    /// The account's code. Empty for externally owned accounts.
    pub code: Vec<u8>,
}

/// A single update applied to storage when a transaction is committed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StateUpdate {
    /// Set the balance of an account.
    Balance(Address, Word),
    /// Set the nonce of an account.
    Nonce(Address, u64),
    /// Replace the code of an account.
    Code(Address, Code),
    /// Set a persistent storage slot. A zero word clears the slot.
    Storage(Address, Key, Word),
    /// Erase an account along with all of its storage.
    Destroy(Address),
}

/// Read access to account state.
///
/// Accounts that were never written read as zero balance, zero nonce, empty
/// code and all-zero storage.
pub trait QueryState {
    /// The native balance of the account.
    fn balance(&self, address: &Address) -> anyhow::Result<Word>;

    /// The nonce of the account.
    fn nonce(&self, address: &Address) -> anyhow::Result<u64>;

    /// The code of the account.
    fn code(&self, address: &Address) -> anyhow::Result<Code>;

    /// The value of a persistent storage slot of the account.
    fn storage(&self, address: &Address, key: &Key) -> anyhow::Result<Word>;

    /// The hash of the account's code.
    fn code_hash(&self, address: &Address) -> anyhow::Result<Hash> {
        let code = self.code(address)?;
        Ok(code_hash(&code))
    }
}

/// Read access to transient storage.
///
/// Transient storage lives for a single transaction, so only
/// transaction-scoped state implements this.
pub trait QueryTransient {
    /// The value of a transient storage slot of the account.
    fn transient(&self, address: &Address, key: &Key) -> anyhow::Result<Word>;
}

/// Storage that can durably apply batches of updates.
pub trait StateStorage: QueryState {
    /// Apply all updates in order as a single batch.
    fn update_state_batch<U>(&self, updates: U) -> anyhow::Result<()>
    where
        U: IntoIterator<Item = StateUpdate>;
}

/// The hash identifying the given code.
pub fn code_hash(code: &[u8]) -> Hash {
    statefence_utils::hash_bytes(code)
}
