//! Runtime faults for the Tarn VM.
//!
//! Every fault carries the index of the instruction that raised it (`at`).
//! Faults are fatal: the engine stops and reports the first one.

use tarn_common::ValueError;
use thiserror::Error;

use crate::state::StackError;

/// Errors that stop execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A reserved opcode reached dispatch.
    #[error("unknown opcode {opcode:#06x} at instruction {at}")]
    UnknownOpcode { at: usize, opcode: u16 },

    /// SYSCALL with an id nobody registered.
    #[error("unknown syscall {id} at instruction {at}")]
    UnknownSyscall { at: usize, id: i32 },

    /// A syscall callback failed for a host-side reason.
    #[error("host error at instruction {at}: {message}")]
    HostError { at: usize, message: String },

    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    #[error("stack overflow (limit {limit}) at instruction {at}")]
    StackOverflow { at: usize, limit: usize },

    #[error("call depth exceeded (limit {limit}) at instruction {at}")]
    CallDepthExceeded { at: usize, limit: usize },

    #[error("local index {index} out of range ({count} slots) at instruction {at}")]
    InvalidLocalIndex { at: usize, index: i64, count: usize },

    #[error("constant index {index} out of range ({count} constants) at instruction {at}")]
    InvalidConstantIndex { at: usize, index: i64, count: usize },

    #[error("function index {index} out of range ({count} functions) at instruction {at}")]
    InvalidFunctionIndex { at: usize, index: i64, count: usize },

    /// The instruction pointer left `0..=len`.
    #[error("corrupted program counter {target} (program length {len}) at instruction {at}")]
    CorruptedProgramCounter { at: usize, target: i64, len: usize },

    /// A return found no frame to pop.
    #[error("corrupted call stack at instruction {at}")]
    CorruptedCallStack { at: usize },

    #[error("type mismatch in {op} at instruction {at}: {found}")]
    TypeMismatch {
        at: usize,
        op: &'static str,
        found: String,
    },

    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    #[error("arithmetic overflow in {op} at instruction {at}")]
    ArithmeticOverflow { at: usize, op: &'static str },
}

impl RuntimeError {
    /// The instruction index that raised this fault.
    pub fn at(&self) -> usize {
        match self {
            RuntimeError::UnknownOpcode { at, .. }
            | RuntimeError::UnknownSyscall { at, .. }
            | RuntimeError::HostError { at, .. }
            | RuntimeError::StackUnderflow { at }
            | RuntimeError::StackOverflow { at, .. }
            | RuntimeError::CallDepthExceeded { at, .. }
            | RuntimeError::InvalidLocalIndex { at, .. }
            | RuntimeError::InvalidConstantIndex { at, .. }
            | RuntimeError::InvalidFunctionIndex { at, .. }
            | RuntimeError::CorruptedProgramCounter { at, .. }
            | RuntimeError::CorruptedCallStack { at }
            | RuntimeError::TypeMismatch { at, .. }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::ArithmeticOverflow { at, .. } => *at,
        }
    }

    pub fn from_value(err: ValueError, at: usize) -> Self {
        match err {
            ValueError::TypeMismatch { op, found } => RuntimeError::TypeMismatch { at, op, found },
            ValueError::DivisionByZero => RuntimeError::DivisionByZero { at },
            ValueError::ArithmeticOverflow { op } => RuntimeError::ArithmeticOverflow { at, op },
        }
    }

    pub fn from_stack(err: StackError, at: usize) -> Self {
        match err {
            StackError::Underflow => RuntimeError::StackUnderflow { at },
            StackError::Overflow { limit } => RuntimeError::StackOverflow { at, limit },
            StackError::DepthExceeded { limit } => RuntimeError::CallDepthExceeded { at, limit },
            StackError::EmptyCallStack => RuntimeError::CorruptedCallStack { at },
            StackError::InvalidLocal { index, count } => RuntimeError::InvalidLocalIndex {
                at,
                index: index as i64,
                count,
            },
        }
    }
}

/// Attach an instruction index to a lower-level error.
pub(crate) trait FaultAt<T> {
    fn at(self, at: usize) -> Result<T, RuntimeError>;
}

impl<T> FaultAt<T> for Result<T, StackError> {
    fn at(self, at: usize) -> Result<T, RuntimeError> {
        self.map_err(|e| RuntimeError::from_stack(e, at))
    }
}

impl<T> FaultAt<T> for Result<T, ValueError> {
    fn at(self, at: usize) -> Result<T, RuntimeError> {
        self.map_err(|e| RuntimeError::from_value(e, at))
    }
}
