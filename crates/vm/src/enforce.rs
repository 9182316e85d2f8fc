//! Permission checks at each point where a frame mutates state.
//!
//! Each check passes trivially while the frame's guard is inactive. While it
//! is active, delegated calls and self-destruction are always denied, and every
//! other mutation must be permitted for each address it touches. A denied
//! mutation halts the frame before anything has been written.

use crate::guard::FrameGuard;
use statefence_types::{Address, Category, Key, Word};
use thiserror::Error;

/// A single state mutation a frame attempted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mutation {
    /// Installing code at the address.
    Code(Address),
    /// Bumping the address's nonce.
    Nonce(Address),
    /// Moving value into or out of the address.
    Balance(Address),
    /// Writing a persistent storage slot.
    Storage(Address, Key),
    /// Writing a transient storage slot.
    TransientStorage(Address, Key),
    /// Running foreign code against the frame's own state.
    DelegateCall,
    /// Destroying the address.
    SelfDestruct(Address),
}

/// A mutation was attempted outside of the frame's permissions.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("mutation denied: {0:?}")]
pub struct Denied(pub Mutation);

/// Check a single mutation against the guard.
pub fn check(guard: &FrameGuard, mutation: Mutation) -> Result<(), Denied> {
    if !guard.is_active() {
        return Ok(());
    }
    let permissions = guard.permissions();
    let allowed = match mutation {
        Mutation::Code(address) => permissions.allows(&address, Category::Code),
        Mutation::Nonce(address) => permissions.allows(&address, Category::Nonce),
        Mutation::Balance(address) => permissions.allows(&address, Category::Balance),
        Mutation::Storage(address, key) => permissions.allows_storage(&address, &key),
        Mutation::TransientStorage(address, key) => {
            permissions.allows_transient_storage(&address, &key)
        }
        Mutation::DelegateCall | Mutation::SelfDestruct(_) => false,
    };
    if !allowed {
        #[cfg(feature = "tracing")]
        tracing::debug!(?mutation, origin = ?guard.origin(), "denied mutation");
        return Err(Denied(mutation));
    }
    Ok(())
}

/// A call from `from` to `to` carrying `value`.
pub fn value_call(guard: &FrameGuard, from: Address, to: Address, value: Word) -> Result<(), Denied> {
    if value.is_zero() {
        return Ok(());
    }
    check(guard, Mutation::Balance(from))?;
    check(guard, Mutation::Balance(to))
}

/// `creator` creating `created` with an endowment of `value`.
pub fn create(guard: &FrameGuard, creator: Address, created: Address, value: Word) -> Result<(), Denied> {
    check(guard, Mutation::Code(created))?;
    check(guard, Mutation::Nonce(created))?;
    check(guard, Mutation::Nonce(creator))?;
    if !value.is_zero() {
        check(guard, Mutation::Balance(creator))?;
        check(guard, Mutation::Balance(created))?;
    }
    Ok(())
}

/// A persistent storage write.
pub fn storage_write(guard: &FrameGuard, address: Address, key: Key) -> Result<(), Denied> {
    check(guard, Mutation::Storage(address, key))
}

/// A transient storage write.
pub fn transient_write(guard: &FrameGuard, address: Address, key: Key) -> Result<(), Denied> {
    check(guard, Mutation::TransientStorage(address, key))
}

/// A delegated call.
pub fn delegate_call(guard: &FrameGuard) -> Result<(), Denied> {
    check(guard, Mutation::DelegateCall)
}

/// The destruction of `address`.
pub fn self_destruct(guard: &FrameGuard, address: Address) -> Result<(), Denied> {
    check(guard, Mutation::SelfDestruct(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionSet;
    use statefence_types::{Category, MutableSet, MutableSetList, PolicyEntry};

    const A: Address = Address::repeat_byte(0xAA);
    const B: Address = Address::repeat_byte(0xBB);

    fn guard(sets: Vec<(Address, Vec<PolicyEntry>)>) -> FrameGuard {
        let list = MutableSetList(
            sets.into_iter()
                .map(|(address, entries)| MutableSet { address, entries })
                .collect(),
        );
        let mut guard = FrameGuard::default();
        guard.enable(PermissionSet::from_list(&list));
        guard
    }

    #[test]
    fn inactive_guard_allows_everything() {
        let guard = FrameGuard::default();
        assert!(delegate_call(&guard).is_ok());
        assert!(self_destruct(&guard, A).is_ok());
        assert!(value_call(&guard, A, B, Word::one()).is_ok());
        assert!(storage_write(&guard, A, Key::zero()).is_ok());
    }

    #[test]
    fn always_denied_when_active() {
        let all = [
            PolicyEntry::scalar(Category::Code, true),
            PolicyEntry::scalar(Category::Nonce, true),
            PolicyEntry::scalar(Category::Balance, true),
        ];
        let guard = guard(vec![(A, all.to_vec())]);
        assert_eq!(delegate_call(&guard), Err(Denied(Mutation::DelegateCall)));
        assert_eq!(
            self_destruct(&guard, A),
            Err(Denied(Mutation::SelfDestruct(A)))
        );
    }

    #[test]
    fn value_calls_need_both_sides() {
        let balance = PolicyEntry::scalar(Category::Balance, true);
        let one_side = guard(vec![(A, vec![balance.clone()])]);
        assert!(value_call(&one_side, A, B, Word::zero()).is_ok());
        assert_eq!(
            value_call(&one_side, A, B, Word::one()),
            Err(Denied(Mutation::Balance(B)))
        );
        let both = guard(vec![(A, vec![balance.clone()]), (B, vec![balance])]);
        assert!(value_call(&both, A, B, Word::one()).is_ok());
    }

    #[test]
    fn create_needs_code_and_nonces() {
        use Category::*;
        let created = guard(vec![(
            B,
            vec![PolicyEntry::scalar(Code, true), PolicyEntry::scalar(Nonce, true)],
        )]);
        assert_eq!(
            create(&created, A, B, Word::zero()),
            Err(Denied(Mutation::Nonce(A)))
        );
        let full = guard(vec![
            (
                B,
                vec![PolicyEntry::scalar(Code, true), PolicyEntry::scalar(Nonce, true)],
            ),
            (A, vec![PolicyEntry::scalar(Nonce, true)]),
        ]);
        assert!(create(&full, A, B, Word::zero()).is_ok());
        assert_eq!(
            create(&full, A, B, Word::one()),
            Err(Denied(Mutation::Balance(A)))
        );
    }

    #[test]
    fn storage_slots() {
        let slot = Key::repeat_byte(5);
        let guard = guard(vec![(
            A,
            vec![
                PolicyEntry::storage([slot]),
                PolicyEntry::transient_storage([slot]),
            ],
        )]);
        assert!(storage_write(&guard, A, slot).is_ok());
        assert!(transient_write(&guard, A, slot).is_ok());
        assert!(storage_write(&guard, A, Key::repeat_byte(6)).is_err());
        assert!(storage_write(&guard, B, slot).is_err());
    }
}
