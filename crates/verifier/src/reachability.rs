//! Reachability analysis for Tarn modules.
//!
//! Every instruction must be reachable from some function entry by
//! fall-through or jump edges. Unreachable instructions are errors.

use tarn_common::{Instruction, Module, Opcode};

use crate::error::VerifyError;

/// Run the reachability check.
pub fn check_reachability(module: &Module) -> Vec<VerifyError> {
    let instrs = module.instructions();
    let mut reachable = vec![false; instrs.len()];

    for function in module.functions() {
        mark_reachable(instrs, function.entry_index, &mut reachable);
    }

    (0..instrs.len())
        .filter(|&at| !reachable[at])
        .map(|at| VerifyError::UnreachableInstruction { at })
        .collect()
}

/// Mark every instruction reachable from `start`.
fn mark_reachable(instrs: &[Instruction], start: usize, reachable: &mut [bool]) {
    let mut pending = vec![start];
    while let Some(pc) = pending.pop() {
        if pc >= instrs.len() || reachable[pc] {
            continue;
        }
        reachable[pc] = true;

        let instr = &instrs[pc];
        let target = usize::try_from(instr.operand0).ok();
        match instr.opcode {
            Opcode::Halt | Opcode::Return => {}
            Opcode::Jump => pending.extend(target),
            Opcode::JumpIfFalse => {
                pending.extend(target);
                pending.push(pc + 1);
            }
            _ => pending.push(pc + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_common::FunctionInfo;

    fn module(instructions: Vec<Instruction>, functions: Vec<FunctionInfo>) -> Module {
        Module::new(vec![], instructions, functions, 0).unwrap()
    }

    fn main(instructions: Vec<Instruction>) -> Module {
        module(instructions, vec![FunctionInfo::new("main", 0, 0, 0)])
    }

    #[test]
    fn all_reachable_no_errors() {
        let m = main(vec![Instruction::op(Opcode::Nop), Instruction::op(Opcode::Halt)]);
        assert!(check_reachability(&m).is_empty());
    }

    #[test]
    fn unreachable_after_halt() {
        let m = main(vec![
            Instruction::op(Opcode::Halt),
            Instruction::op(Opcode::Nop),
        ]);
        assert_eq!(
            check_reachability(&m),
            vec![VerifyError::UnreachableInstruction { at: 1 }]
        );
    }

    #[test]
    fn jump_skips_code() {
        let m = main(vec![
            Instruction::with_operand(Opcode::Jump, 2),
            Instruction::op(Opcode::Nop),
            Instruction::op(Opcode::Halt),
        ]);
        assert_eq!(
            check_reachability(&m),
            vec![VerifyError::UnreachableInstruction { at: 1 }]
        );
    }

    #[test]
    fn conditional_reaches_both_sides() {
        let m = main(vec![
            Instruction::with_operand(Opcode::JumpIfFalse, 3),
            Instruction::op(Opcode::Nop),
            Instruction::op(Opcode::Return),
            Instruction::op(Opcode::Halt),
        ]);
        assert!(check_reachability(&m).is_empty());
    }

    #[test]
    fn backward_loop_terminates() {
        let m = main(vec![
            Instruction::op(Opcode::Nop),
            Instruction::with_operand(Opcode::Jump, 0),
        ]);
        assert!(check_reachability(&m).is_empty());
    }

    #[test]
    fn function_body_reachable_from_its_entry() {
        let m = module(
            vec![
                Instruction::with_operand(Opcode::Call, 1),
                Instruction::op(Opcode::Halt),
                Instruction::op(Opcode::Return),
            ],
            vec![
                FunctionInfo::new("main", 0, 0, 0),
                FunctionInfo::new("f", 2, 0, 0),
            ],
        );
        assert!(check_reachability(&m).is_empty());
    }

    #[test]
    fn out_of_range_targets_are_ignored() {
        let m = main(vec![Instruction::with_operand(Opcode::Jump, 99)]);
        assert!(check_reachability(&m).is_empty());
    }
}
