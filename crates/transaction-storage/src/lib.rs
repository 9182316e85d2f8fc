#![deny(missing_docs)]
//! # Transaction Storage
//!
//! Provides a transactional layer on top of a state storage.
//!
//! All writes land in an overlay built from persistent maps, so taking a
//! [`Snapshot`] before a call frame and rolling back to it after a failed
//! frame are both O(1). Transient storage only ever lives in the overlay and
//! is dropped when the transaction is committed or rolled back.

use statefence_storage::{Code, QueryState, QueryTransient, StateStorage, StateUpdate};
use statefence_types::{Address, Key, Word};


/// Wrapper around a state storage that provides transactional semantics.
pub struct TransactionStorage<S> {
    storage: S,
    overlay: Overlay,
}

/// A point-in-time copy of a transaction's pending writes.
#[derive(Clone, Default)]
pub struct Snapshot(Overlay);

#[derive(Clone, Default)]
struct Overlay {
    balances: imbl::HashMap<Address, Word>,
    nonces: imbl::HashMap<Address, u64>,
    codes: imbl::HashMap<Address, Code>,
    storage: imbl::HashMap<(Address, Key), Word>,
    destroyed: imbl::HashSet<Address>,
    transient: imbl::HashMap<(Address, Key), Word>,
}

impl<S> TransactionStorage<S> {
    /// Create a new transaction storage around the given state storage.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            overlay: Overlay::default(),
        }
    }

    /// Take a snapshot of the pending writes.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.overlay.clone())
    }

    /// Discard every write made since the snapshot was taken.
    pub fn rollback_to(&mut self, snapshot: Snapshot) {
        self.overlay = snapshot.0;
    }

    /// Rollback the transaction.
    pub fn rollback(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("rolling back transaction");
        self.overlay = Overlay::default();
    }

    /// Set the balance of an account.
    pub fn set_balance(&mut self, address: Address, balance: Word) {
        self.overlay.balances.insert(address, balance);
    }

    /// Set the nonce of an account.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.overlay.nonces.insert(address, nonce);
    }

    /// Replace the code of an account.
    pub fn set_code(&mut self, address: Address, code: Code) {
        self.overlay.codes.insert(address, code);
    }

    /// Write a persistent storage slot.
    pub fn set_storage(&mut self, address: Address, key: Key, value: Word) {
        self.overlay.storage.insert((address, key), value);
    }

    /// Write a transient storage slot.
    pub fn set_transient(&mut self, address: Address, key: Key, value: Word) {
        self.overlay.transient.insert((address, key), value);
    }

    /// Erase the account, its code and all of its persistent storage.
    pub fn destroy(&mut self, address: Address) {
        let overlay = &mut self.overlay;
        overlay.balances.insert(address, Word::zero());
        overlay.nonces.insert(address, 0);
        overlay.codes.insert(address, Code::from(&[][..]));
        overlay.storage.retain(|(a, _), _| *a != address);
        overlay.destroyed.insert(address);
    }
}

impl<S> TransactionStorage<S>
where
    S: QueryState,
{
    /// Move `value` from one account to another.
    ///
    /// Returns `false` without writing anything if `from` cannot cover the value.
    pub fn transfer(&mut self, from: Address, to: Address, value: Word) -> anyhow::Result<bool> {
        let from_balance = self.balance(&from)?;
        let Some(new_from_balance) = from_balance.checked_sub(value) else {
            return Ok(false);
        };
        if from == to || value.is_zero() {
            return Ok(true);
        }
        let to_balance = self.balance(&to)?;
        let Some(new_to_balance) = to_balance.checked_add(value) else {
            return Ok(false);
        };
        self.set_balance(from, new_from_balance);
        self.set_balance(to, new_to_balance);
        Ok(true)
    }
}

impl<S> TransactionStorage<S>
where
    S: StateStorage,
{
    /// Commit the transaction.
    ///
    /// Account erasures are applied before any other update so that writes made
    /// after an erasure within the transaction survive it. The pending writes
    /// are kept if the underlying storage fails to apply the batch.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    pub fn commit(&mut self) -> anyhow::Result<()> {
        let Overlay {
            balances,
            nonces,
            codes,
            storage,
            destroyed,
            transient: _,
        } = self.overlay.clone();
        let updates: Vec<StateUpdate> = destroyed
            .into_iter()
            .map(StateUpdate::Destroy)
            .chain(balances.into_iter().map(|(a, b)| StateUpdate::Balance(a, b)))
            .chain(nonces.into_iter().map(|(a, n)| StateUpdate::Nonce(a, n)))
            .chain(codes.into_iter().map(|(a, c)| StateUpdate::Code(a, c)))
            .chain(
                storage
                    .into_iter()
                    .map(|((a, k), v)| StateUpdate::Storage(a, k, v)),
            )
            .collect();
        #[cfg(feature = "tracing")]
        tracing::debug!(updates = updates.len(), "committing transaction");
        self.storage.update_state_batch(updates)?;
        self.overlay = Overlay::default();
        Ok(())
    }
}

impl<S> QueryState for TransactionStorage<S>
where
    S: QueryState,
{
    fn balance(&self, address: &Address) -> anyhow::Result<Word> {
        match self.overlay.balances.get(address) {
            Some(balance) => Ok(*balance),
            None => self.storage.balance(address),
        }
    }

    fn nonce(&self, address: &Address) -> anyhow::Result<u64> {
        match self.overlay.nonces.get(address) {
            Some(nonce) => Ok(*nonce),
            None => self.storage.nonce(address),
        }
    }

    fn code(&self, address: &Address) -> anyhow::Result<Code> {
        match self.overlay.codes.get(address) {
            Some(code) => Ok(code.clone()),
            None => self.storage.code(address),
        }
    }

    fn storage(&self, address: &Address, key: &Key) -> anyhow::Result<Word> {
        if let Some(value) = self.overlay.storage.get(&(*address, *key)) {
            return Ok(*value);
        }
        if self.overlay.destroyed.contains(address) {
            return Ok(Word::zero());
        }
        self.storage.storage(address, key)
    }
}

impl<S> QueryTransient for TransactionStorage<S> {
    fn transient(&self, address: &Address, key: &Key) -> anyhow::Result<Word> {
        let value = self.overlay.transient.get(&(*address, *key)).copied();
        Ok(value.unwrap_or_default())
    }
}
