//! Tarn verifier: static checks for modules.
//!
//! The verifier checks a [`Module`] BEFORE execution so that a run cannot
//! fault on a malformed index or an unimplemented opcode. It collects ALL
//! errors (not just the first) and returns them. Verification is optional:
//! the VM reports the same problems as runtime faults.
//!
//! # Usage
//!
//! ```
//! use tarn_common::{FunctionInfo, Instruction, Module, Opcode, Value};
//! use tarn_verifier::verify;
//!
//! let module = Module::new(
//!     vec![Value::Int(42)],
//!     vec![
//!         Instruction::with_operand(Opcode::PushConst, 0),
//!         Instruction::op(Opcode::Halt),
//!     ],
//!     vec![FunctionInfo::new("main", 0, 0, 0)],
//!     0,
//! )
//! .unwrap();
//!
//! assert!(verify(&module).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Bounds**: size limit, constant/function/jump/local indices
//! 2. **Structural**: function entries, reserved opcodes, unused operands
//! 3. **Reachability**: dead code detection

pub mod bounds;
pub mod error;
pub mod reachability;
pub mod structural;

pub use error::VerifyError;

use tarn_common::Module;

/// Verify a module.
///
/// Returns `Ok(())` if the module passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found, in pass order.
pub fn verify(module: &Module) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = Vec::new();

    // Pass 1: Bounds
    all_errors.extend(bounds::check_bounds(module));

    // Pass 2: Structural
    all_errors.extend(structural::check_structural(module));

    // Pass 3: Reachability
    all_errors.extend(reachability::check_reachability(module));

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_common::{FunctionInfo, Instruction, Opcode, Value};

    #[test]
    fn minimal_valid_module() {
        let module = Module::new(
            vec![],
            vec![Instruction::op(Opcode::Halt)],
            vec![FunctionInfo::new("main", 0, 0, 0)],
            0,
        )
        .unwrap();
        assert!(verify(&module).is_ok());
    }

    #[test]
    fn empty_body_is_valid() {
        let module = Module::new(vec![], vec![], vec![FunctionInfo::new("main", 0, 0, 0)], 0).unwrap();
        assert!(verify(&module).is_ok());
    }

    #[test]
    fn multiple_errors_collected() {
        let module = Module::new(
            vec![Value::Int(1)],
            vec![
                Instruction::with_operand(Opcode::PushConst, 7),
                Instruction::op(Opcode::Halt),
                Instruction::op(Opcode::Or),
            ],
            vec![FunctionInfo::new("main", 0, 0, 0)],
            0,
        )
        .unwrap();
        let errors = verify(&module).unwrap_err();
        assert_eq!(
            errors,
            vec![
                VerifyError::ConstantOutOfRange {
                    at: 0,
                    index: 7,
                    count: 1
                },
                VerifyError::ReservedOpcode {
                    at: 2,
                    opcode: Opcode::Or
                },
                VerifyError::UnreachableInstruction { at: 2 },
            ]
        );
    }
}
