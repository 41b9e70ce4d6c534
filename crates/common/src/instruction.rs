//! Instruction records.
//!
//! Every instruction is exactly 10 bytes, encoded little-endian:
//! ```text
//! Bytes 0-1: opcode (u16)
//! Bytes 2-5: operand0 (i32)
//! Bytes 6-9: operand1 (i32)
//! ```
//! Jump operands are absolute instruction indices.

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// Size of one encoded instruction record in bytes.
pub const RECORD_SIZE: usize = 10;

/// A single Tarn instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Meaning depends on the opcode; see [`Opcode::operand_kind`].
    pub operand0: i32,
    /// Reserved. Zero for every current opcode.
    pub operand1: i32,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand0: i32, operand1: i32) -> Self {
        Self {
            opcode,
            operand0,
            operand1,
        }
    }

    /// An instruction with both operands zero.
    pub fn op(opcode: Opcode) -> Self {
        Self::new(opcode, 0, 0)
    }

    /// An instruction with `operand0` set and `operand1` zero.
    pub fn with_operand(opcode: Opcode, operand0: i32) -> Self {
        Self::new(opcode, operand0, 0)
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..2].copy_from_slice(&self.opcode.code().to_le_bytes());
        bytes[2..6].copy_from_slice(&self.operand0.to_le_bytes());
        bytes[6..10].copy_from_slice(&self.operand1.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: [u8; RECORD_SIZE]) -> Result<Self, DecodeError> {
        let opcode = Opcode::try_from(u16::from_le_bytes([bytes[0], bytes[1]]))?;
        let operand0 = i32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        let operand1 = i32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        Ok(Self {
            opcode,
            operand0,
            operand1,
        })
    }
}

/// Encode an instruction stream as concatenated records.
pub fn encode_instructions(instructions: &[Instruction]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(instructions.len() * RECORD_SIZE);
    for instr in instructions {
        bytes.extend_from_slice(&instr.encode());
    }
    bytes
}

/// Decode concatenated records. The length must be a multiple of
/// [`RECORD_SIZE`].
pub fn decode_instructions(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(DecodeError::InvalidLength(bytes.len()));
    }
    bytes
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| {
            let mut record = [0u8; RECORD_SIZE];
            record.copy_from_slice(chunk);
            Instruction::decode(record)
        })
        .collect()
}
