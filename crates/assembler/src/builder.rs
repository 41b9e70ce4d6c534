//! Label-resolving instruction assembler.
//!
//! Jumps may refer to labels that are marked later. [`Assembler::emit_jump`]
//! writes a placeholder operand and records a patch; [`Assembler::finish`]
//! replaces every placeholder with the label's absolute instruction index.

use std::collections::HashMap;

use tarn_common::{Instruction, Opcode};

use crate::error::AsmError;

#[derive(Debug, Clone)]
struct Patch {
    at: usize,
    label: String,
}

/// Builds an instruction stream with symbolic jump targets.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    patches: Vec<Patch>,
}

/// Convert an instruction position into an operand.
pub(crate) fn position_operand(position: usize) -> Result<i32, AsmError> {
    i32::try_from(position).map_err(|_| AsmError::OperandOverflow { position })
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction and return its index.
    pub fn emit(&mut self, opcode: Opcode, operand0: i32, operand1: i32) -> usize {
        self.instructions
            .push(Instruction::new(opcode, operand0, operand1));
        self.instructions.len() - 1
    }

    /// Append an instruction without operands.
    pub fn emit_op(&mut self, opcode: Opcode) -> usize {
        self.emit(opcode, 0, 0)
    }

    /// Bind `name` to the index of the next instruction.
    pub fn mark_label(&mut self, name: &str) -> Result<(), AsmError> {
        if self.labels.contains_key(name) {
            return Err(AsmError::DuplicateLabel {
                label: name.to_string(),
            });
        }
        self.labels.insert(name.to_string(), self.position());
        Ok(())
    }

    /// Append `opcode` with a placeholder target, resolved to `label` by
    /// [`finish`](Self::finish).
    pub fn emit_jump(&mut self, opcode: Opcode, label: &str) -> usize {
        let at = self.emit(opcode, 0, 0);
        self.patches.push(Patch {
            at,
            label: label.to_string(),
        });
        at
    }

    /// Index the next emitted instruction will get.
    pub fn position(&self) -> usize {
        self.instructions.len()
    }

    /// Where `name` was marked, if it was.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Overwrite `operand0` of an already emitted instruction.
    pub(crate) fn set_operand(&mut self, at: usize, operand0: i32) {
        if let Some(instr) = self.instructions.get_mut(at) {
            instr.operand0 = operand0;
        }
    }

    /// Resolve every pending jump and return the instruction stream.
    pub fn finish(mut self) -> Result<Vec<Instruction>, AsmError> {
        for patch in std::mem::take(&mut self.patches) {
            let target = self
                .labels
                .get(&patch.label)
                .copied()
                .ok_or(AsmError::UndefinedLabel {
                    label: patch.label.clone(),
                    at: patch.at,
                })?;
            self.set_operand(patch.at, position_operand(target)?);
        }
        Ok(self.instructions)
    }
}
