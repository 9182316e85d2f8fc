#![deny(missing_docs)]
//! # Memory Storage
//!
//! An in-memory implementation of the statefence storage traits.

use statefence_storage::{Account, Code, QueryState, StateStorage, StateUpdate};
use statefence_types::{Address, Key, Word};
use statefence_utils::Lock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

#[cfg(test)]
mod tests;

/// In-memory account state.
///
/// Cloning is cheap and clones share the same underlying state.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Lock<Inner>>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Address, AccountEntry>,
    storage: HashMap<Address, BTreeMap<Key, Word>>,
}

#[derive(Clone, Default)]
struct AccountEntry {
    nonce: u64,
    balance: Word,
    code: Option<Code>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Lock::new(Inner::default())),
        }
    }

    /// Insert or replace an account. Its storage is left untouched.
    pub fn insert_account(&self, address: Address, account: Account) {
        let Account {
            nonce,
            balance,
            code,
        } = account;
        let entry = AccountEntry {
            nonce,
            balance,
            code: (!code.is_empty()).then(|| Code::from(code)),
        };
        self.inner.apply(|i| i.accounts.insert(address, entry));
    }

    /// Set a storage slot directly. A zero word clears the slot.
    pub fn insert_storage(&self, address: Address, key: Key, value: Word) {
        self.inner.apply(|i| i.set_storage(address, key, value));
    }

    /// The number of non-zero storage slots held for the account.
    pub fn storage_len(&self, address: &Address) -> usize {
        self.inner
            .apply(|i| i.storage.get(address).map_or(0, |slots| slots.len()))
    }
}

impl Inner {
    fn account(&self, address: &Address) -> Option<&AccountEntry> {
        self.accounts.get(address)
    }

    fn set_storage(&mut self, address: Address, key: Key, value: Word) {
        if value.is_zero() {
            if let Some(slots) = self.storage.get_mut(&address) {
                slots.remove(&key);
                if slots.is_empty() {
                    self.storage.remove(&address);
                }
            }
        } else {
            self.storage.entry(address).or_default().insert(key, value);
        }
    }

    fn apply_update(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::Balance(address, balance) => {
                self.accounts.entry(address).or_default().balance = balance;
            }
            StateUpdate::Nonce(address, nonce) => {
                self.accounts.entry(address).or_default().nonce = nonce;
            }
            StateUpdate::Code(address, code) => {
                let code = (!code.is_empty()).then_some(code);
                self.accounts.entry(address).or_default().code = code;
            }
            StateUpdate::Storage(address, key, value) => self.set_storage(address, key, value),
            StateUpdate::Destroy(address) => {
                self.accounts.remove(&address);
                self.storage.remove(&address);
            }
        }
    }
}

impl QueryState for MemoryStorage {
    fn balance(&self, address: &Address) -> anyhow::Result<Word> {
        let balance = self
            .inner
            .apply(|i| i.account(address).map(|a| a.balance));
        Ok(balance.unwrap_or_default())
    }

    fn nonce(&self, address: &Address) -> anyhow::Result<u64> {
        let nonce = self.inner.apply(|i| i.account(address).map(|a| a.nonce));
        Ok(nonce.unwrap_or_default())
    }

    fn code(&self, address: &Address) -> anyhow::Result<Code> {
        let code = self
            .inner
            .apply(|i| i.account(address).and_then(|a| a.code.clone()));
        Ok(code.unwrap_or_else(|| Code::from(&[][..])))
    }

    fn storage(&self, address: &Address, key: &Key) -> anyhow::Result<Word> {
        let value = self.inner.apply(|i| {
            i.storage
                .get(address)
                .and_then(|slots| slots.get(key))
                .copied()
        });
        Ok(value.unwrap_or_default())
    }
}

impl StateStorage for MemoryStorage {
    fn update_state_batch<U>(&self, updates: U) -> anyhow::Result<()>
    where
        U: IntoIterator<Item = StateUpdate>,
    {
        let updates: Vec<_> = updates.into_iter().collect();
        self.inner.apply(|i| {
            for update in updates {
                i.apply_update(update);
            }
        });
        Ok(())
    }
}
