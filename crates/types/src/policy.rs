//! The mutable-set list declared by the restricting instruction and its RLP codec.
//!
//! The wire layout is a list of nested RLP lists:
//!
//! ```text
//! PolicyEntry    = [category: u8, allowed: 0 | 1, [slot: 32 bytes; n]]
//! MutableSet     = [address: 20 bytes, [PolicyEntry; n]]
//! MutableSetList = [MutableSet; n]
//! ```
//!
//! The slot list of a `Code`, `Nonce` or `Balance` entry must be empty.

use crate::{Address, Key};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};


/// A category of account state that a frame may be permitted to mutate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    /// Replacing the account's code.
    Code = 0,
    /// Bumping the account's nonce.
    Nonce = 1,
    /// Moving value into or out of the account.
    Balance = 2,
    /// Writing persistent storage slots.
    Storage = 3,
    /// Writing transient storage slots.
    TransientStorage = 4,
}

/// Whether a category of mutation is allowed for an address.
///
/// `slots` is only meaningful for the two storage categories, where it lists
/// the only slot keys that may be written.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// The category this entry applies to.
    pub category: Category,
    /// Whether mutations of this category are allowed.
    pub allowed: bool,
    /// The writable slot keys for storage categories. Empty otherwise.
    pub slots: Vec<Key>,
}

/// The policy entries declared for a single address.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MutableSet {
    /// The address the entries apply to.
    pub address: Address,
    /// Entries in declaration order. Later entries win for the same category.
    pub entries: Vec<PolicyEntry>,
}

/// The full permission list as declared by one restricting instruction.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MutableSetList(pub Vec<MutableSet>);

impl Category {
    /// Whether the category carries a slot list.
    pub fn has_slots(self) -> bool {
        matches!(self, Self::Storage | Self::TransientStorage)
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> Self {
        category as u8
    }
}

impl TryFrom<u8> for Category {
    type Error = DecoderError;
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let category = match byte {
            0 => Self::Code,
            1 => Self::Nonce,
            2 => Self::Balance,
            3 => Self::Storage,
            4 => Self::TransientStorage,
            _ => return Err(DecoderError::Custom("unknown policy category")),
        };
        Ok(category)
    }
}

impl PolicyEntry {
    /// Allow or deny a scalar category.
    pub fn scalar(category: Category, allowed: bool) -> Self {
        Self {
            category,
            allowed,
            slots: vec![],
        }
    }

    /// Allow writes to the given persistent storage slots.
    pub fn storage(slots: impl IntoIterator<Item = Key>) -> Self {
        Self {
            category: Category::Storage,
            allowed: true,
            slots: slots.into_iter().collect(),
        }
    }

    /// Allow writes to the given transient storage slots.
    pub fn transient_storage(slots: impl IntoIterator<Item = Key>) -> Self {
        Self {
            category: Category::TransientStorage,
            allowed: true,
            slots: slots.into_iter().collect(),
        }
    }
}

impl MutableSetList {
    /// Encode the list into its RLP wire form.
    pub fn to_rlp(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    /// Decode a list from the front of `bytes`.
    ///
    /// Trailing bytes after the encoded list are ignored. Any item whose
    /// declared length would reach past the end of `bytes` is an error.
    pub fn from_rlp(bytes: &[u8]) -> Result<Self, DecoderError> {
        let rlp = Rlp::new(bytes);
        let info = rlp.payload_info()?;
        if info.total() > bytes.len() {
            return Err(DecoderError::RlpIsTooShort);
        }
        Rlp::new(&bytes[..info.total()]).as_val()
    }
}

impl Encodable for PolicyEntry {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&u8::from(self.category));
        s.append(&u8::from(self.allowed));
        s.append_list::<Key, Key>(&self.slots);
    }
}

impl Decodable for PolicyEntry {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let category = Category::try_from(rlp.val_at::<u8>(0)?)?;
        let allowed = match rlp.val_at::<u8>(1)? {
            0 => false,
            1 => true,
            _ => return Err(DecoderError::Custom("non-canonical boolean")),
        };
        let slots: Vec<Key> = rlp.list_at(2)?;
        if !category.has_slots() && !slots.is_empty() {
            return Err(DecoderError::Custom("slot payload on scalar category"));
        }
        Ok(Self {
            category,
            allowed,
            slots,
        })
    }
}

impl Encodable for MutableSet {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.append_list::<PolicyEntry, PolicyEntry>(&self.entries);
    }
}

impl Decodable for MutableSet {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            address: rlp.val_at(0)?,
            entries: rlp.list_at(1)?,
        })
    }
}

impl Encodable for MutableSetList {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append_list::<MutableSet, MutableSet>(&self.0);
    }
}

impl Decodable for MutableSetList {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList);
        }
        rlp.as_list().map(Self)
    }
}

impl From<Vec<MutableSet>> for MutableSetList {
    fn from(sets: Vec<MutableSet>) -> Self {
        Self(sets)
    }
}

impl core::ops::Deref for MutableSetList {
    type Target = Vec<MutableSet>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
