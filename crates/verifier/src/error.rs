//! Verification errors for the Tarn verifier.
//!
//! Every error that concerns a single instruction carries its index (`at`).
//! The verifier collects ALL errors, not just the first.

use tarn_common::Opcode;
use thiserror::Error;

use crate::bounds::MAX_PROGRAM_SIZE;

/// Errors found during static verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Bounds ---
    /// Module exceeds the maximum instruction count.
    #[error("program too large: {size} instructions (max {})", MAX_PROGRAM_SIZE)]
    ProgramTooLarge { size: usize },

    /// `PUSH_CONST` names a constant that does not exist.
    #[error("constant index {index} out of range at instruction {at} (pool size {count})")]
    ConstantOutOfRange { at: usize, index: i32, count: usize },

    /// `CALL` names a function that does not exist.
    #[error("function index {index} out of range at instruction {at} (function count {count})")]
    FunctionOutOfRange { at: usize, index: i32, count: usize },

    /// A jump lands outside `0..=len`.
    #[error("jump target {target} out of range at instruction {at} (length {len})")]
    JumpOutOfRange { at: usize, target: i32, len: usize },

    /// A local slot beyond the owning function's slot count.
    #[error("local index {index} out of range at instruction {at} ({slots} slot(s))")]
    LocalOutOfRange { at: usize, index: i32, slots: usize },

    /// A local access before the first function entry, so no frame owns it.
    #[error("local access at instruction {at} is outside every function")]
    OutsideFunction { at: usize },

    // --- Structural ---
    /// A function entry lies outside `0..=len`.
    #[error("function {function} ('{name}') entry {entry} out of range (length {len})")]
    FunctionEntryOutOfRange {
        function: usize,
        name: String,
        entry: usize,
        len: usize,
    },

    /// An opcode the engine does not implement.
    #[error("reserved opcode {} at instruction {at}", .opcode.mnemonic())]
    ReservedOpcode { at: usize, opcode: Opcode },

    /// An operand the opcode does not use is non-zero.
    #[error("non-zero unused operand at instruction {at}")]
    NonZeroUnusedField { at: usize },

    // --- Reachability ---
    /// Instruction is unreachable from any function entry.
    #[error("unreachable instruction at {at}")]
    UnreachableInstruction { at: usize },
}

impl VerifyError {
    /// The instruction index the error concerns, when there is one.
    pub fn at(&self) -> Option<usize> {
        match self {
            VerifyError::ConstantOutOfRange { at, .. }
            | VerifyError::FunctionOutOfRange { at, .. }
            | VerifyError::JumpOutOfRange { at, .. }
            | VerifyError::LocalOutOfRange { at, .. }
            | VerifyError::OutsideFunction { at }
            | VerifyError::ReservedOpcode { at, .. }
            | VerifyError::NonZeroUnusedField { at }
            | VerifyError::UnreachableInstruction { at } => Some(*at),
            VerifyError::ProgramTooLarge { .. } | VerifyError::FunctionEntryOutOfRange { .. } => None,
        }
    }
}
