//! `Op::Restrict` implementation.

use crate::{
    error::{OpResult, RestrictError},
    gas::{GasMeter, GasSchedule},
    guard::FrameGuard,
    memory::{self, usize_from_word},
    permission::PermissionSet,
    Vm,
};
use statefence_types::{convert::bool_from_word, MutableSetList};

/// Pop `[offset, max_len, enable]` and update the frame's guard.
///
/// The region `offset..offset + max_len` is paid for as memory expansion and
/// per word of `max_len` whether or not the guard is being enabled. When
/// enabling, the mutable set list must decode from within the region.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub(crate) fn restrict(
    guard: &mut FrameGuard,
    vm: &mut Vm,
    gas: &mut GasMeter,
    schedule: &GasSchedule,
) -> OpResult<()> {
    let [offset, max_len, enable] = vm.stack.pop3()?;
    let offset = usize_from_word(offset)?;
    let max_len = usize_from_word(max_len)?;
    gas.charge(schedule.restrict_decode_cost(max_len))?;
    memory::expand(vm, gas, schedule, offset, max_len)?;
    let enable = bool_from_word(enable).ok_or(RestrictError::InvalidFlag(enable))?;
    if !enable {
        guard.disable();
        #[cfg(feature = "tracing")]
        tracing::debug!(origin = ?guard.origin(), "restriction released");
        return Ok(());
    }
    let bytes = vm.memory.slice(offset, max_len)?;
    let list = MutableSetList::from_rlp(bytes).map_err(RestrictError::from)?;
    guard.enable(PermissionSet::from_list(&list));
    #[cfg(feature = "tracing")]
    tracing::debug!(
        origin = ?guard.origin(),
        addresses = list.len(),
        "restriction established"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::OpError, guard::GuardOrigin};
    use statefence_types::{
        convert::key_from_word, Address, Category, MutableSet, PolicyEntry, Word,
    };

    const A: Address = Address::repeat_byte(0xAA);

    fn list(slots: &[u64]) -> MutableSetList {
        MutableSetList(vec![MutableSet {
            address: A,
            entries: vec![PolicyEntry::storage(
                slots.iter().map(|&n| key_from_word(Word::from(n))),
            )],
        }])
    }

    // A VM with the encoded list written at offset 0 and the operands pushed.
    fn vm_with(bytes: &[u8], max_len: usize, enable: u64) -> Vm {
        let mut vm = Vm::default();
        vm.memory.grow_to(bytes.len().div_ceil(32));
        vm.memory.store(0, bytes).unwrap();
        for w in [0, max_len as u64, enable] {
            vm.stack.push(Word::from(w)).unwrap();
        }
        vm
    }

    fn run(guard: &mut FrameGuard, vm: &mut Vm) -> OpResult<GasMeter> {
        let mut gas = GasMeter::new(1_000_000);
        restrict(guard, vm, &mut gas, &GasSchedule::default())?;
        Ok(gas)
    }

    #[test]
    fn enable_then_disable() {
        let bytes = list(&[5]).to_rlp();
        let mut guard = FrameGuard::default();
        run(&mut guard, &mut vm_with(&bytes, bytes.len(), 1)).unwrap();
        assert_eq!(guard.origin(), GuardOrigin::Local);
        assert!(guard.permissions().allows(&A, Category::Storage));

        run(&mut guard, &mut vm_with(&[], 0, 0)).unwrap();
        assert_eq!(guard, FrameGuard::default());
    }

    #[test]
    fn inherited_guard_narrows() {
        let parent = PermissionSet::from_list(&list(&[1, 2]));
        let mut guard = FrameGuard::inherited(parent.clone());
        let bytes = list(&[2, 3]).to_rlp();
        run(&mut guard, &mut vm_with(&bytes, bytes.len(), 1)).unwrap();
        assert_eq!(guard.origin(), GuardOrigin::Inherited);
        assert_eq!(guard.permissions(), &PermissionSet::from_list(&list(&[2])));

        run(&mut guard, &mut vm_with(&[], 0, 0)).unwrap();
        assert_eq!(guard.origin(), GuardOrigin::Inherited);
    }

    #[test]
    fn list_must_fit_within_max_len() {
        let bytes = list(&[5]).to_rlp();
        let mut guard = FrameGuard::default();
        let err = run(&mut guard, &mut vm_with(&bytes, bytes.len() - 1, 1)).unwrap_err();
        assert!(matches!(err, OpError::Restrict(RestrictError::Decode(_))));
        assert_eq!(guard, FrameGuard::default());
    }

    #[test]
    fn invalid_flag() {
        let mut guard = FrameGuard::default();
        let err = run(&mut guard, &mut vm_with(&[], 0, 2)).unwrap_err();
        assert!(matches!(err, OpError::Restrict(RestrictError::InvalidFlag(_))));
    }

    #[test]
    fn missing_operands() {
        let mut guard = FrameGuard::default();
        let mut vm = Vm::default();
        vm.stack.push(Word::one()).unwrap();
        assert!(matches!(run(&mut guard, &mut vm), Err(OpError::Stack(_))));
    }

    #[test]
    fn cost_scales_with_max_len() {
        let schedule = GasSchedule::default();
        let mut guard = FrameGuard::default();
        let small = run(&mut guard, &mut vm_with(&[], 32, 0)).unwrap();
        let large = run(&mut guard, &mut vm_with(&[], 320, 0)).unwrap();
        let decode = schedule.restrict_decode_cost(320) - schedule.restrict_decode_cost(32);
        let expansion = schedule.memory_cost(10) - schedule.memory_cost(1);
        assert_eq!(large.spent() - small.spent(), decode + expansion);
    }
}
