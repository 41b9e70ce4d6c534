//! Structural validation pass for Tarn modules.
//!
//! Checks function entries, reserved opcodes and unused operand fields.

use tarn_common::{Module, OperandKind};

use crate::error::VerifyError;

/// Run the structural validation pass.
pub fn check_structural(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let len = module.len();

    for (function, info) in module.functions().iter().enumerate() {
        if info.entry_index > len {
            errors.push(VerifyError::FunctionEntryOutOfRange {
                function,
                name: info.name.clone(),
                entry: info.entry_index,
                len,
            });
        }
    }

    for (at, instr) in module.instructions().iter().enumerate() {
        if instr.opcode.is_reserved() {
            errors.push(VerifyError::ReservedOpcode {
                at,
                opcode: instr.opcode,
            });
        }
        let operand0_unused = instr.opcode.operand_kind() == OperandKind::None;
        if instr.operand1 != 0 || (operand0_unused && instr.operand0 != 0) {
            errors.push(VerifyError::NonZeroUnusedField { at });
        }
    }

    errors
}
