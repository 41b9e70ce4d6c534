//! Tarn common types and encodings.
//!
//! This crate provides the data structures shared by the assembler, the
//! verifier and the VM:
//!
//! - [`Value`] and [`Decimal`]: runtime values
//! - [`Opcode`] and [`Instruction`]: the instruction set and its 10-byte records
//! - [`Module`] and [`FunctionInfo`]: the validated program model and its image format
//! - [`DecodeError`], [`ValidationError`], [`ValueError`]

pub mod decimal;
pub mod error;
pub mod image;
pub mod instruction;
pub mod module;
pub mod opcode;
pub mod value;
pub mod value_kind;

pub use decimal::{Decimal, ParseDecimalError};
pub use error::{DecodeError, EncodeError, ValidationError, ValueError};
pub use instruction::{decode_instructions, encode_instructions, Instruction, RECORD_SIZE};
pub use module::{FunctionInfo, Module};
pub use opcode::{OperandKind, Opcode};
pub use value::{ArithOp, Value};
pub use value_kind::ValueKind;
