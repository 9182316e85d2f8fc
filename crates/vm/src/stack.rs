//! The operand stack of a frame.

use crate::error::{StackError, StackResult};
use statefence_types::Word;

/// The VM's `Stack`, i.e. a `Vec` of `Word`s updated during each step of execution.
///
/// A light wrapper around `Vec<Word>` that bounds its size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stack(Vec<Word>);

impl Stack {
    /// The maximum number of words held by the stack.
    pub const SIZE_LIMIT: usize = 1024;

    /// Push a word onto the stack.
    pub fn push(&mut self, word: Word) -> StackResult<()> {
        if self.0.len() >= Self::SIZE_LIMIT {
            return Err(StackError::Overflow);
        }
        self.0.push(word);
        Ok(())
    }

    /// Push a `bool` as `0` or `1`.
    pub fn push_bool(&mut self, b: bool) -> StackResult<()> {
        self.push(Word::from(u8::from(b)))
    }

    /// Pop the top word, producing an error in the case that the stack is empty.
    pub fn pop(&mut self) -> StackResult<Word> {
        self.0.pop().ok_or(StackError::Empty)
    }

    /// Pop the top 2 values from the stack.
    ///
    /// The last values popped appear first in the returned fixed-size array.
    pub fn pop2(&mut self) -> StackResult<[Word; 2]> {
        let w1 = self.pop()?;
        let w0 = self.pop()?;
        Ok([w0, w1])
    }

    /// Pop the top 3 values from the stack.
    ///
    /// The last values popped appear first in the returned fixed-size array.
    pub fn pop3(&mut self) -> StackResult<[Word; 3]> {
        let w2 = self.pop()?;
        let [w0, w1] = self.pop2()?;
        Ok([w0, w1, w2])
    }

    /// Pop 1 word from the stack, apply the given function and push the returned word.
    pub fn pop1_push1<F>(&mut self, f: F) -> StackResult<()>
    where
        F: FnOnce(Word) -> Word,
    {
        let w = self.pop()?;
        self.push(f(w))
    }

    /// Pop 2 words from the stack, apply the given function and push the returned word.
    pub fn pop2_push1<F>(&mut self, f: F) -> StackResult<()>
    where
        F: FnOnce(Word, Word) -> Word,
    {
        let [w0, w1] = self.pop2()?;
        self.push(f(w0, w1))
    }

    /// Pop 1 word from the stack and push it back twice.
    pub fn dup(&mut self) -> StackResult<()> {
        let w = self.pop()?;
        self.push(w)?;
        self.push(w)
    }

    /// Swap the top two words.
    pub fn swap(&mut self) -> StackResult<()> {
        let [w0, w1] = self.pop2()?;
        self.push(w1)?;
        self.push(w0)
    }
}

impl From<Stack> for Vec<Word> {
    fn from(stack: Stack) -> Self {
        stack.0
    }
}

impl core::ops::Deref for Stack {
    type Target = Vec<Word>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
