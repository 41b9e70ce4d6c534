//! Bounds checking for Tarn modules.
//!
//! Every index an instruction carries must name something that exists:
//! constants, functions, jump targets and local slots.

use tarn_common::{Module, OperandKind};

use crate::error::VerifyError;

/// Maximum module size in instructions.
pub const MAX_PROGRAM_SIZE: usize = 1 << 20;

/// Run the bounds check.
pub fn check_bounds(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let len = module.len();

    if len > MAX_PROGRAM_SIZE {
        errors.push(VerifyError::ProgramTooLarge { size: len });
    }

    for (at, instr) in module.instructions().iter().enumerate() {
        let operand = instr.operand0;
        let index = usize::try_from(operand).ok();
        match instr.opcode.operand_kind() {
            OperandKind::Constant => {
                let count = module.constants().len();
                if !index.is_some_and(|i| i < count) {
                    errors.push(VerifyError::ConstantOutOfRange {
                        at,
                        index: operand,
                        count,
                    });
                }
            }
            OperandKind::Function => {
                let count = module.functions().len();
                if !index.is_some_and(|i| i < count) {
                    errors.push(VerifyError::FunctionOutOfRange {
                        at,
                        index: operand,
                        count,
                    });
                }
            }
            OperandKind::Target => {
                if !index.is_some_and(|t| t <= len) {
                    errors.push(VerifyError::JumpOutOfRange {
                        at,
                        target: operand,
                        len,
                    });
                }
            }
            OperandKind::Local => match module.owning_function(at) {
                None => errors.push(VerifyError::OutsideFunction { at }),
                Some((_, owner)) => {
                    let slots = owner.slot_count();
                    if !index.is_some_and(|i| i < slots) {
                        errors.push(VerifyError::LocalOutOfRange {
                            at,
                            index: operand,
                            slots,
                        });
                    }
                }
            },
            OperandKind::None | OperandKind::Syscall => {}
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_common::{FunctionInfo, Instruction, Opcode, Value};

    fn module(instructions: Vec<Instruction>, functions: Vec<FunctionInfo>) -> Module {
        Module::new(vec![Value::Int(1)], instructions, functions, 0).unwrap()
    }

    fn main(instructions: Vec<Instruction>) -> Module {
        module(instructions, vec![FunctionInfo::new("main", 0, 0, 2)])
    }

    #[test]
    fn in_range_operands_pass() {
        let m = main(vec![
            Instruction::with_operand(Opcode::PushConst, 0),
            Instruction::with_operand(Opcode::StoreLocal, 1),
            Instruction::with_operand(Opcode::Jump, 3),
            Instruction::with_operand(Opcode::Call, 0),
        ]);
        assert!(check_bounds(&m).is_empty());
    }

    #[test]
    fn jump_to_len_is_allowed() {
        let m = main(vec![Instruction::with_operand(Opcode::Jump, 1)]);
        assert!(check_bounds(&m).is_empty());
    }

    #[test]
    fn constant_out_of_range() {
        let m = main(vec![Instruction::with_operand(Opcode::PushConst, 1)]);
        assert_eq!(
            check_bounds(&m),
            vec![VerifyError::ConstantOutOfRange {
                at: 0,
                index: 1,
                count: 1
            }]
        );
    }

    #[test]
    fn negative_jump() {
        let m = main(vec![Instruction::with_operand(Opcode::JumpIfFalse, -2)]);
        assert_eq!(
            check_bounds(&m),
            vec![VerifyError::JumpOutOfRange {
                at: 0,
                target: -2,
                len: 1
            }]
        );
    }

    #[test]
    fn local_checked_against_owner() {
        let m = module(
            vec![
                Instruction::with_operand(Opcode::LoadLocal, 1),
                Instruction::with_operand(Opcode::LoadLocal, 1),
            ],
            vec![
                FunctionInfo::new("main", 0, 0, 2),
                FunctionInfo::new("small", 1, 1, 0),
            ],
        );
        assert_eq!(
            check_bounds(&m),
            vec![VerifyError::LocalOutOfRange {
                at: 1,
                index: 1,
                slots: 1
            }]
        );
    }

    #[test]
    fn local_before_any_function() {
        let m = module(
            vec![
                Instruction::with_operand(Opcode::LoadLocal, 0),
                Instruction::op(Opcode::Halt),
            ],
            vec![FunctionInfo::new("main", 1, 0, 1)],
        );
        assert_eq!(check_bounds(&m), vec![VerifyError::OutsideFunction { at: 0 }]);
    }

    #[test]
    fn syscall_ids_are_not_checked() {
        let m = main(vec![Instruction::with_operand(Opcode::Syscall, 999)]);
        assert!(check_bounds(&m).is_empty());
    }
}
