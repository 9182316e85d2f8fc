//! Control flow operation implementations.
//!
//! Jump destinations are operation indices. Jumping to or past the end of the
//! program ends the frame the same way running off the end does.

use crate::{
    error::{ControlFlowError, OpResult},
    Vm,
};
use statefence_types::{convert::bool_from_word, Word};

fn destination(word: Word) -> Result<usize, ControlFlowError> {
    usize::try_from(word).map_err(|_| ControlFlowError::InvalidJumpDestination(word))
}

/// `Op::Jump` implementation.
pub fn jump(vm: &mut Vm) -> OpResult<usize> {
    let new_pc = vm.stack.pop()?;
    Ok(destination(new_pc)?)
}

/// `Op::JumpIf` implementation.
pub fn jump_if(vm: &mut Vm) -> OpResult<usize> {
    let [new_pc, cond] = vm.stack.pop2()?;
    let cond = bool_from_word(cond).ok_or(ControlFlowError::InvalidJumpIfCondition(cond))?;
    let new_pc = match cond {
        true => destination(new_pc)?,
        false => vm.pc.checked_add(1).expect("pc can never exceed `usize`"),
    };
    Ok(new_pc)
}
