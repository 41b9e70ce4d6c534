//! Error types shared across the Tarn toolchain.

use thiserror::Error;

/// Errors from decoding instruction records or module images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The opcode field holds a code that is not part of the instruction set.
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    /// Instruction record stream length is not a multiple of the record size.
    #[error("invalid record stream length: {0} (must be multiple of 10)")]
    InvalidLength(usize),

    /// Module image does not start with the `TARN` magic.
    #[error("bad magic: not a tarn module image")]
    BadMagic,

    /// Module image was written by an unknown format version.
    #[error("unsupported image version {0}")]
    UnsupportedVersion(u16),

    /// Module image ended in the middle of a field.
    #[error("unexpected end of image at byte {offset}")]
    UnexpectedEof { offset: usize },

    /// Constant pool entry has an unknown value tag.
    #[error("invalid value tag {tag:#04x} at byte {offset}")]
    InvalidValueTag { tag: u8, offset: usize },

    /// A string payload is not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// A decimal payload has a scale outside the supported range.
    #[error("invalid decimal scale {scale} at byte {offset}")]
    InvalidDecimal { scale: u8, offset: usize },

    /// Bytes remain after the last section.
    #[error("{0} trailing bytes after module image")]
    TrailingBytes(usize),

    /// The decoded module failed construction-time validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors from writing a module image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A count or index does not fit the image's `u32` fields.
    #[error("{field} {value} does not fit in a module image")]
    FieldTooLarge { field: &'static str, value: usize },
}

/// Errors from constructing a [`Module`](crate::Module).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The function table is empty, so there is no entry point.
    #[error("module has no functions")]
    NoFunctions,

    /// The entry index does not name a function.
    #[error("entry index {index} out of range (function count {count})")]
    EntryIndexOutOfRange { index: usize, count: usize },
}

/// Errors from value-level operations (arithmetic, comparison, accessors).
///
/// These carry no instruction index; the VM attaches one when it turns them
/// into runtime faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Operand kinds are not valid for the operation.
    #[error("type mismatch in {op}: {found}")]
    TypeMismatch { op: &'static str, found: String },

    /// Right operand of a division is numerically zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer or decimal result does not fit.
    #[error("arithmetic overflow in {op}")]
    ArithmeticOverflow { op: &'static str },
}
