use serde::Serialize;
use sha2::Digest;
use statefence_types::Hash;
use std::sync::Mutex;


/// A mutex that only hands out access for the duration of a closure.
pub struct Lock<T> {
    data: Mutex<T>,
}

impl<T> Lock<T> {
    pub fn new(data: T) -> Self {
        Lock {
            data: Mutex::new(data),
        }
    }

    /// Apply `f` to the locked data.
    ///
    /// The data is never left half-updated by a panicking closure in this
    /// workspace, so a poisoned lock is recovered rather than propagated.
    pub fn apply<U>(&self, f: impl FnOnce(&mut T) -> U) -> U {
        let mut guard = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

/// Hash the postcard serialization of `t`.
pub fn hash<T: Serialize>(t: &T) -> Hash {
    // Serializing into an allocated `Vec` only fails for unsized sequences,
    // which none of the hashed types contain.
    let data = postcard::to_allocvec(t).expect("serialization into a Vec cannot fail");
    hash_bytes(&data)
}

/// The sha256 of the given bytes.
pub fn hash_bytes(bytes: &[u8]) -> Hash {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    Hash::from(<[u8; 32]>::from(hasher.finalize()))
}
