//! Opcode definitions for the Tarn instruction set.

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u16)]` attribute gives each variant the stable code used in
/// instruction records.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// No operation.
    Nop = 0x0000,
    /// Push `constants[operand0]`.
    PushConst = 0x0001,

    // Arithmetic: pop b, pop a, push a op b.
    Add = 0x0002,
    Sub = 0x0003,
    Mul = 0x0004,
    Div = 0x0005,
    /// Pop b, pop a, push `Bool(a < b)`.
    CmpLt = 0x0006,

    // Reserved comparisons. Decoded and assembled, never dispatched.
    CmpEq = 0x0007,
    CmpNe = 0x0008,
    CmpLe = 0x0009,
    CmpGt = 0x000A,
    CmpGe = 0x000B,

    /// Push `locals[operand0]` of the current frame.
    LoadLocal = 0x0010,
    /// Pop into `locals[operand0]` of the current frame.
    StoreLocal = 0x0011,

    /// Set ip to the absolute index `operand0`.
    Jump = 0x0020,
    /// Pop a Bool; jump to `operand0` when it is false.
    JumpIfFalse = 0x0021,

    /// Call `functions[operand0]`.
    Call = 0x0030,
    /// Pop the current frame.
    Return = 0x0031,

    // Reserved logic. Decoded and assembled, never dispatched.
    Not = 0x0040,
    And = 0x0041,
    Or = 0x0042,

    /// Stop execution; ip advances past the HALT.
    Halt = 0x00FF,

    /// Invoke the host callback registered under `operand0`.
    Syscall = 0x0600,
}

/// All opcodes, in code order.
pub const ALL_OPCODES: [Opcode; 23] = [
    Opcode::Nop,
    Opcode::PushConst,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::CmpLt,
    Opcode::CmpEq,
    Opcode::CmpNe,
    Opcode::CmpLe,
    Opcode::CmpGt,
    Opcode::CmpGe,
    Opcode::LoadLocal,
    Opcode::StoreLocal,
    Opcode::Jump,
    Opcode::JumpIfFalse,
    Opcode::Call,
    Opcode::Return,
    Opcode::Not,
    Opcode::And,
    Opcode::Or,
    Opcode::Halt,
    Opcode::Syscall,
];

/// What an opcode's `operand0` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Operand is unused and must be zero.
    None,
    /// Index into the constant pool.
    Constant,
    /// Local slot in the current frame.
    Local,
    /// Absolute instruction index.
    Target,
    /// Index into the function table.
    Function,
    /// Host syscall id.
    Syscall,
}

impl TryFrom<u16> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0000 => Ok(Opcode::Nop),
            0x0001 => Ok(Opcode::PushConst),

            0x0002 => Ok(Opcode::Add),
            0x0003 => Ok(Opcode::Sub),
            0x0004 => Ok(Opcode::Mul),
            0x0005 => Ok(Opcode::Div),
            0x0006 => Ok(Opcode::CmpLt),

            0x0007 => Ok(Opcode::CmpEq),
            0x0008 => Ok(Opcode::CmpNe),
            0x0009 => Ok(Opcode::CmpLe),
            0x000A => Ok(Opcode::CmpGt),
            0x000B => Ok(Opcode::CmpGe),

            0x0010 => Ok(Opcode::LoadLocal),
            0x0011 => Ok(Opcode::StoreLocal),

            0x0020 => Ok(Opcode::Jump),
            0x0021 => Ok(Opcode::JumpIfFalse),

            0x0030 => Ok(Opcode::Call),
            0x0031 => Ok(Opcode::Return),

            0x0040 => Ok(Opcode::Not),
            0x0041 => Ok(Opcode::And),
            0x0042 => Ok(Opcode::Or),

            0x00FF => Ok(Opcode::Halt),
            0x0600 => Ok(Opcode::Syscall),

            _ => Err(DecodeError::UnknownOpcode(value)),
        }
    }
}

impl Opcode {
    /// The stable 16-bit code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::PushConst => "PUSH_CONST",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::CmpLt => "CMP_LT",
            Opcode::CmpEq => "CMP_EQ",
            Opcode::CmpNe => "CMP_NE",
            Opcode::CmpLe => "CMP_LE",
            Opcode::CmpGt => "CMP_GT",
            Opcode::CmpGe => "CMP_GE",
            Opcode::LoadLocal => "LOAD_LOCAL",
            Opcode::StoreLocal => "STORE_LOCAL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Not => "NOT",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Halt => "HALT",
            Opcode::Syscall => "SYSCALL",
        }
    }

    /// Case-insensitive lookup by mnemonic.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
            .copied()
    }

    /// Declared but not implemented by the dispatch engine.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Opcode::CmpEq
                | Opcode::CmpNe
                | Opcode::CmpLe
                | Opcode::CmpGt
                | Opcode::CmpGe
                | Opcode::Not
                | Opcode::And
                | Opcode::Or
        )
    }

    pub fn operand_kind(&self) -> OperandKind {
        match self {
            Opcode::PushConst => OperandKind::Constant,
            Opcode::LoadLocal | Opcode::StoreLocal => OperandKind::Local,
            Opcode::Jump | Opcode::JumpIfFalse => OperandKind::Target,
            Opcode::Call => OperandKind::Function,
            Opcode::Syscall => OperandKind::Syscall,
            _ => OperandKind::None,
        }
    }

    /// True for opcodes that may transfer control to `operand0`.
    pub fn is_jump(&self) -> bool {
        self.operand_kind() == OperandKind::Target
    }
}
