//! Memory operation implementations and related items.

use crate::{
    error::{MemoryError, MemoryResult, OpResult},
    gas::{GasMeter, GasSchedule},
    Vm,
};
use statefence_types::{convert::bytes_from_word, Word};

/// A type representing the VM's memory.
///
/// Byte-addressed and zero-initialised. Memory only ever grows, in whole
/// 32-byte words, and growth is paid for through [`GasSchedule::memory_cost`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Memory(Vec<u8>);

impl Memory {
    /// The maximum number of bytes held in memory.
    pub const SIZE_LIMIT: usize = 1 << 20;

    /// The current size of memory in 32-byte words.
    pub fn words(&self) -> usize {
        self.0.len() / 32
    }

    /// The number of words memory must grow to so that `offset..offset + len` is in range.
    ///
    /// An empty range never requires growth.
    pub fn words_required(&self, offset: usize, len: usize) -> MemoryResult<usize> {
        if len == 0 {
            return Ok(self.words());
        }
        let end = offset.checked_add(len).ok_or(MemoryError::Overflow)?;
        if end > Self::SIZE_LIMIT {
            return Err(MemoryError::Overflow);
        }
        Ok(self.words().max(end.div_ceil(32)))
    }

    /// Grow memory to the given number of words.
    pub fn grow_to(&mut self, words: usize) {
        let len = words * 32;
        if len > self.0.len() {
            self.0.resize(len, 0);
        }
    }

    /// The bytes in the given range. The range must already be in memory.
    pub fn slice(&self, offset: usize, len: usize) -> MemoryResult<&[u8]> {
        let end = offset.checked_add(len).ok_or(MemoryError::IndexOutOfBounds)?;
        self.0.get(offset..end).ok_or(MemoryError::IndexOutOfBounds)
    }

    /// Load the word starting at the given byte offset.
    pub fn load(&self, offset: usize) -> MemoryResult<Word> {
        Ok(Word::from_big_endian(self.slice(offset, 32)?))
    }

    /// Store the bytes at the given offset.
    pub fn store(&mut self, offset: usize, bytes: &[u8]) -> MemoryResult<()> {
        let end = offset
            .checked_add(bytes.len())
            .ok_or(MemoryError::IndexOutOfBounds)?;
        self.0
            .get_mut(offset..end)
            .ok_or(MemoryError::IndexOutOfBounds)?
            .copy_from_slice(bytes);
        Ok(())
    }
}

impl core::ops::Deref for Memory {
    type Target = Vec<u8>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Memory> for Vec<u8> {
    fn from(memory: Memory) -> Self {
        memory.0
    }
}

/// Convert an offset or length word into a `usize`.
pub(crate) fn usize_from_word(word: Word) -> MemoryResult<usize> {
    usize::try_from(word).map_err(|_| MemoryError::IndexOutOfBounds)
}

/// Grow memory to cover `offset..offset + len`, charging for the growth.
pub(crate) fn expand(
    vm: &mut Vm,
    gas: &mut GasMeter,
    schedule: &GasSchedule,
    offset: usize,
    len: usize,
) -> OpResult<()> {
    let words = vm.memory.words_required(offset, len)?;
    let cost = schedule.memory_cost(words) - schedule.memory_cost(vm.memory.words());
    gas.charge(cost)?;
    vm.memory.grow_to(words);
    Ok(())
}

/// Pop `[offset, len]` from the stack and return the bytes, growing memory as necessary.
pub(crate) fn pop_range(vm: &mut Vm, gas: &mut GasMeter, schedule: &GasSchedule) -> OpResult<Vec<u8>> {
    let [offset, len] = vm.stack.pop2()?;
    let offset = usize_from_word(offset)?;
    let len = usize_from_word(len)?;
    expand(vm, gas, schedule, offset, len)?;
    Ok(vm.memory.slice(offset, len)?.to_vec())
}

/// `Op::MLoad` implementation.
pub(crate) fn mload(vm: &mut Vm, gas: &mut GasMeter, schedule: &GasSchedule) -> OpResult<()> {
    let offset = usize_from_word(vm.stack.pop()?)?;
    expand(vm, gas, schedule, offset, 32)?;
    let word = vm.memory.load(offset)?;
    vm.stack.push(word)?;
    Ok(())
}

/// `Op::MStore` implementation.
pub(crate) fn mstore(vm: &mut Vm, gas: &mut GasMeter, schedule: &GasSchedule) -> OpResult<()> {
    let [offset, word] = vm.stack.pop2()?;
    let offset = usize_from_word(offset)?;
    expand(vm, gas, schedule, offset, 32)?;
    vm.memory.store(offset, &bytes_from_word(word))?;
    Ok(())
}

/// `Op::MStore8` implementation.
pub(crate) fn mstore8(vm: &mut Vm, gas: &mut GasMeter, schedule: &GasSchedule) -> OpResult<()> {
    let [offset, word] = vm.stack.pop2()?;
    let offset = usize_from_word(offset)?;
    expand(vm, gas, schedule, offset, 1)?;
    vm.memory.store(offset, &[word.byte(0)])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_required() {
        let memory = Memory::default();
        assert_eq!(memory.words_required(0, 0).unwrap(), 0);
        assert_eq!(memory.words_required(100, 0).unwrap(), 0);
        assert_eq!(memory.words_required(0, 1).unwrap(), 1);
        assert_eq!(memory.words_required(31, 2).unwrap(), 2);
        assert_eq!(
            memory.words_required(Memory::SIZE_LIMIT, 1),
            Err(MemoryError::Overflow)
        );
        assert_eq!(
            memory.words_required(usize::MAX, 2),
            Err(MemoryError::Overflow)
        );
    }

    #[test]
    fn store_and_load() {
        let mut memory = Memory::default();
        memory.grow_to(2);
        assert_eq!(memory.len(), 64);
        memory.store(32, &bytes_from_word(Word::from(7))).unwrap();
        assert_eq!(memory.load(32).unwrap(), Word::from(7));
        assert_eq!(memory.load(33), Err(MemoryError::IndexOutOfBounds));
        // Memory never shrinks.
        memory.grow_to(1);
        assert_eq!(memory.words(), 2);
    }
}
