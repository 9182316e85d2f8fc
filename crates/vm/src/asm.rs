//! The VM's operations and their bytecode encoding.
//!
//! Each operation is a single opcode byte. `Push` is followed by the 32-byte
//! big-endian word it pushes.
//!
//! Where an operation takes several stack operands they are listed in push
//! order, so the last operand listed is the one on top of the stack.

use statefence_types::{convert::bytes_from_word, Word};
use thiserror::Error;

/// A single VM operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Op {
    /// End the frame successfully.
    Halt,
    /// Push a word.
    Push(Word),
    /// `[w]` -> `[]`
    Pop,
    /// `[w]` -> `[w, w]`
    Dup,
    /// `[a, b]` -> `[b, a]`
    Swap,
    /// `[a, b]` -> `[a + b]`, wrapping.
    Add,
    /// `[a, b]` -> `[a - b]`, wrapping.
    Sub,
    /// `[a, b]` -> `[a == b]`
    Eq,
    /// `[a, b]` -> `[a < b]`
    Lt,
    /// `[a]` -> `[a == 0]`
    Not,
    /// `[pc]` -> `[]`
    Jump,
    /// `[pc, cond]` -> `[]`
    JumpIf,
    /// `[offset]` -> `[word]`
    MLoad,
    /// `[offset, word]` -> `[]`
    MStore,
    /// `[offset, word]` -> `[]`, storing the low byte only.
    MStore8,
    /// Push the address whose state the frame runs against.
    Address,
    /// Push the address that called into the frame.
    Caller,
    /// Push the value transferred into the frame.
    CallValue,
    /// `[address]` -> `[balance]`
    Balance,
    /// Push the frame's own balance.
    SelfBalance,
    /// `[address]` -> `[code hash]`
    CodeHash,
    /// `[key]` -> `[value]`
    SLoad,
    /// `[key, value]` -> `[]`
    SStore,
    /// `[key]` -> `[value]`
    TLoad,
    /// `[key, value]` -> `[]`
    TStore,
    /// `[gas, address, value]` -> `[success]`
    Call,
    /// `[gas, address]` -> `[success]`
    StaticCall,
    /// `[gas, address]` -> `[success]`
    DelegateCall,
    /// `[value, offset, len]` -> `[address or 0]`
    Create,
    /// `[beneficiary]` -> `[]`
    SelfDestruct,
    /// End the frame, discarding its state changes.
    Revert,
    /// `[offset, len]` -> `[]`, ending the frame successfully with output.
    Return,
    /// `[offset, max_len, enable]` -> `[]`, restricting state mutation.
    Restrict,
}

/// The byte identifying each operation. Variants mirror those of [`Op`].
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Opcode {
    Halt = 0x00,
    Push = 0x01,
    Pop = 0x02,
    Dup = 0x03,
    Swap = 0x04,
    Add = 0x05,
    Sub = 0x06,
    Eq = 0x07,
    Lt = 0x08,
    Not = 0x09,
    Jump = 0x10,
    JumpIf = 0x11,
    MLoad = 0x20,
    MStore = 0x21,
    MStore8 = 0x22,
    Address = 0x30,
    Caller = 0x31,
    CallValue = 0x32,
    Balance = 0x33,
    SelfBalance = 0x34,
    CodeHash = 0x35,
    SLoad = 0x40,
    SStore = 0x41,
    TLoad = 0x42,
    TStore = 0x43,
    Call = 0x50,
    StaticCall = 0x51,
    DelegateCall = 0x52,
    Create = 0x53,
    SelfDestruct = 0x54,
    Revert = 0x55,
    Return = 0x56,
    Restrict = 0x60,
}

/// Errors that may occur while parsing operations from bytes.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum FromBytesError {
    /// The byte is not an opcode.
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),
    /// The bytes ended inside a `Push` word.
    #[error("expected a 32-byte word to follow `Push`")]
    MissingPushWord,
}

impl Op {
    /// The opcode of this operation.
    pub fn opcode(&self) -> Opcode {
        match self {
            Op::Halt => Opcode::Halt,
            Op::Push(_) => Opcode::Push,
            Op::Pop => Opcode::Pop,
            Op::Dup => Opcode::Dup,
            Op::Swap => Opcode::Swap,
            Op::Add => Opcode::Add,
            Op::Sub => Opcode::Sub,
            Op::Eq => Opcode::Eq,
            Op::Lt => Opcode::Lt,
            Op::Not => Opcode::Not,
            Op::Jump => Opcode::Jump,
            Op::JumpIf => Opcode::JumpIf,
            Op::MLoad => Opcode::MLoad,
            Op::MStore => Opcode::MStore,
            Op::MStore8 => Opcode::MStore8,
            Op::Address => Opcode::Address,
            Op::Caller => Opcode::Caller,
            Op::CallValue => Opcode::CallValue,
            Op::Balance => Opcode::Balance,
            Op::SelfBalance => Opcode::SelfBalance,
            Op::CodeHash => Opcode::CodeHash,
            Op::SLoad => Opcode::SLoad,
            Op::SStore => Opcode::SStore,
            Op::TLoad => Opcode::TLoad,
            Op::TStore => Opcode::TStore,
            Op::Call => Opcode::Call,
            Op::StaticCall => Opcode::StaticCall,
            Op::DelegateCall => Opcode::DelegateCall,
            Op::Create => Opcode::Create,
            Op::SelfDestruct => Opcode::SelfDestruct,
            Op::Revert => Opcode::Revert,
            Op::Return => Opcode::Return,
            Op::Restrict => Opcode::Restrict,
        }
    }

    /// The bytecode representation of the operation.
    pub fn to_bytes(&self) -> impl Iterator<Item = u8> {
        let word = match self {
            Op::Push(word) => Some(bytes_from_word(*word)),
            _ => None,
        };
        core::iter::once(self.opcode() as u8).chain(word.into_iter().flatten())
    }

    /// Parse the next operation from the given bytes.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn from_bytes(bytes: &mut impl Iterator<Item = u8>) -> Option<Result<Op, FromBytesError>> {
        let opcode_byte = bytes.next()?;
        let res = Opcode::try_from(opcode_byte).and_then(|opcode| opcode.parse_op(bytes));
        Some(res)
    }
}

impl Opcode {
    /// Parse the operation for this opcode, reading any operand from `bytes`.
    pub fn parse_op(self, bytes: &mut impl Iterator<Item = u8>) -> Result<Op, FromBytesError> {
        let op = match self {
            Opcode::Halt => Op::Halt,
            Opcode::Push => {
                let mut word = [0u8; 32];
                for byte in word.iter_mut() {
                    *byte = bytes.next().ok_or(FromBytesError::MissingPushWord)?;
                }
                Op::Push(Word::from_big_endian(&word))
            }
            Opcode::Pop => Op::Pop,
            Opcode::Dup => Op::Dup,
            Opcode::Swap => Op::Swap,
            Opcode::Add => Op::Add,
            Opcode::Sub => Op::Sub,
            Opcode::Eq => Op::Eq,
            Opcode::Lt => Op::Lt,
            Opcode::Not => Op::Not,
            Opcode::Jump => Op::Jump,
            Opcode::JumpIf => Op::JumpIf,
            Opcode::MLoad => Op::MLoad,
            Opcode::MStore => Op::MStore,
            Opcode::MStore8 => Op::MStore8,
            Opcode::Address => Op::Address,
            Opcode::Caller => Op::Caller,
            Opcode::CallValue => Op::CallValue,
            Opcode::Balance => Op::Balance,
            Opcode::SelfBalance => Op::SelfBalance,
            Opcode::CodeHash => Op::CodeHash,
            Opcode::SLoad => Op::SLoad,
            Opcode::SStore => Op::SStore,
            Opcode::TLoad => Op::TLoad,
            Opcode::TStore => Op::TStore,
            Opcode::Call => Op::Call,
            Opcode::StaticCall => Op::StaticCall,
            Opcode::DelegateCall => Op::DelegateCall,
            Opcode::Create => Op::Create,
            Opcode::SelfDestruct => Op::SelfDestruct,
            Opcode::Revert => Op::Revert,
            Opcode::Return => Op::Return,
            Opcode::Restrict => Op::Restrict,
        };
        Ok(op)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = FromBytesError;
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let opcode = match byte {
            0x00 => Opcode::Halt,
            0x01 => Opcode::Push,
            0x02 => Opcode::Pop,
            0x03 => Opcode::Dup,
            0x04 => Opcode::Swap,
            0x05 => Opcode::Add,
            0x06 => Opcode::Sub,
            0x07 => Opcode::Eq,
            0x08 => Opcode::Lt,
            0x09 => Opcode::Not,
            0x10 => Opcode::Jump,
            0x11 => Opcode::JumpIf,
            0x20 => Opcode::MLoad,
            0x21 => Opcode::MStore,
            0x22 => Opcode::MStore8,
            0x30 => Opcode::Address,
            0x31 => Opcode::Caller,
            0x32 => Opcode::CallValue,
            0x33 => Opcode::Balance,
            0x34 => Opcode::SelfBalance,
            0x35 => Opcode::CodeHash,
            0x40 => Opcode::SLoad,
            0x41 => Opcode::SStore,
            0x42 => Opcode::TLoad,
            0x43 => Opcode::TStore,
            0x50 => Opcode::Call,
            0x51 => Opcode::StaticCall,
            0x52 => Opcode::DelegateCall,
            0x53 => Opcode::Create,
            0x54 => Opcode::SelfDestruct,
            0x55 => Opcode::Revert,
            0x56 => Opcode::Return,
            0x60 => Opcode::Restrict,
            _ => return Err(FromBytesError::InvalidOpcode(byte)),
        };
        Ok(opcode)
    }
}

impl From<Word> for Op {
    fn from(word: Word) -> Self {
        Op::Push(word)
    }
}

/// Convert the given operations into bytecode.
pub fn to_bytes(ops: impl IntoIterator<Item = Op>) -> impl Iterator<Item = u8> {
    ops.into_iter().flat_map(|op| op.to_bytes())
}

/// Parse operations from the given bytecode.
pub fn from_bytes(bytes: impl IntoIterator<Item = u8>) -> impl Iterator<Item = Result<Op, FromBytesError>> {
    let mut bytes = bytes.into_iter();
    core::iter::from_fn(move || Op::from_bytes(&mut bytes))
}
