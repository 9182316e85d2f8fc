//! Conversions between words, keys and addresses.

use crate::{Address, Key, Word};

/// Interpret a key's 32 bytes as a big-endian word.
pub fn word_from_key(key: &Key) -> Word {
    Word::from_big_endian(key.as_bytes())
}

/// The 32-byte big-endian representation of the word as a key.
pub fn key_from_word(word: Word) -> Key {
    Key::from(bytes_from_word(word))
}

/// The 32-byte big-endian representation of the word.
pub fn bytes_from_word(word: Word) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    word.to_big_endian(&mut bytes);
    bytes
}

/// Interpret the address as a word, left-padded with zeroes.
pub fn word_from_address(address: &Address) -> Word {
    Word::from_big_endian(address.as_bytes())
}

/// The address held by the low 20 bytes of the word.
pub fn address_from_word(word: Word) -> Address {
    let bytes = bytes_from_word(word);
    Address::from_slice(&bytes[12..])
}

/// Parse a `bool` from a word, where 0 is false, 1 is true and any other value is invalid.
pub fn bool_from_word(word: Word) -> Option<bool> {
    if word.is_zero() {
        Some(false)
    } else if word == Word::one() {
        Some(true)
    } else {
        None
    }
}
