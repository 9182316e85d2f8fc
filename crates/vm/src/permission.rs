//! Resolved permission sets.

use imbl::{OrdMap, OrdSet};
use statefence_types::{Address, Category, Key, MutableSetList};

/// The mutations a frame may perform, resolved per address.
///
/// Built from a declared [`MutableSetList`] with [`PermissionSet::from_list`].
/// Backed by persistent maps, so handing a copy to a child frame is O(1) and
/// no copy can affect another.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PermissionSet(OrdMap<Address, AccountPermissions>);

/// The mutations permitted on a single address.
///
/// `None` for a storage category means writes to it are denied. `Some` lists
/// the only slots that may be written.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountPermissions {
    /// Code may be installed.
    pub code: bool,
    /// The nonce may be bumped.
    pub nonce: bool,
    /// Value may move in or out.
    pub balance: bool,
    /// Writable persistent storage slots.
    pub storage: Option<OrdSet<Key>>,
    /// Writable transient storage slots.
    pub transient_storage: Option<OrdSet<Key>>,
}

impl PermissionSet {
    /// Resolve a declared list.
    ///
    /// Entries are applied in order, so for a given address and category the
    /// last occurrence wins, including across repeated sets for one address.
    pub fn from_list(list: &MutableSetList) -> Self {
        let mut map = OrdMap::new();
        for set in list.iter() {
            let account: &mut AccountPermissions = map
                .entry(set.address)
                .or_insert_with(AccountPermissions::default);
            for entry in &set.entries {
                let slots = || Some(entry.slots.iter().copied().collect::<OrdSet<Key>>());
                match entry.category {
                    Category::Code => account.code = entry.allowed,
                    Category::Nonce => account.nonce = entry.allowed,
                    Category::Balance => account.balance = entry.allowed,
                    Category::Storage => {
                        account.storage = if entry.allowed { slots() } else { None };
                    }
                    Category::TransientStorage => {
                        account.transient_storage = if entry.allowed { slots() } else { None };
                    }
                }
            }
        }
        Self(map)
    }

    /// The set permitting only what both `self` and `other` permit.
    ///
    /// Neither input is modified.
    pub fn intersect(&self, other: &Self) -> Self {
        let map = self
            .0
            .iter()
            .filter_map(|(address, ours)| {
                let theirs = other.0.get(address)?;
                Some((*address, ours.intersect(theirs)))
            })
            .collect();
        Self(map)
    }

    /// The permissions of the given address, if it is named at all.
    pub fn get(&self, address: &Address) -> Option<&AccountPermissions> {
        self.0.get(address)
    }

    /// Whether no address is named.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the category may be mutated for the address. Storage
    /// categories report whether any slot at all may be written.
    pub fn allows(&self, address: &Address, category: Category) -> bool {
        self.get(address).is_some_and(|p| p.allows(category))
    }

    /// Whether the persistent storage slot may be written.
    pub fn allows_storage(&self, address: &Address, key: &Key) -> bool {
        self.get(address)
            .and_then(|p| p.storage.as_ref())
            .is_some_and(|slots| slots.contains(key))
    }

    /// Whether the transient storage slot may be written.
    pub fn allows_transient_storage(&self, address: &Address, key: &Key) -> bool {
        self.get(address)
            .and_then(|p| p.transient_storage.as_ref())
            .is_some_and(|slots| slots.contains(key))
    }
}

impl AccountPermissions {
    fn allows(&self, category: Category) -> bool {
        match category {
            Category::Code => self.code,
            Category::Nonce => self.nonce,
            Category::Balance => self.balance,
            Category::Storage => self.storage.is_some(),
            Category::TransientStorage => self.transient_storage.is_some(),
        }
    }

    fn intersect(&self, other: &Self) -> Self {
        fn slots(a: &Option<OrdSet<Key>>, b: &Option<OrdSet<Key>>) -> Option<OrdSet<Key>> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a.clone().intersection(b.clone())),
                _ => None,
            }
        }
        Self {
            code: self.code && other.code,
            nonce: self.nonce && other.nonce,
            balance: self.balance && other.balance,
            storage: slots(&self.storage, &other.storage),
            transient_storage: slots(&self.transient_storage, &other.transient_storage),
        }
    }
}

impl From<&MutableSetList> for PermissionSet {
    fn from(list: &MutableSetList) -> Self {
        Self::from_list(list)
    }
}
